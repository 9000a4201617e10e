//! Declarative builder for provisioning templates.
//!
//! Parameters, guards, resources and outputs are declared one at a time on a
//! [`TemplateBuilder`], each returning a typed handle that later declarations
//! use to refer back to it. [`TemplateBuilder::render`] produces a
//! [`Document`] that serializes to the provisioning service's JSON template
//! format, and [`Document::plan`] previews it against deploy-time values.
//!
//! ```rust
//! use stackform_core::{Condition, OMIT, Parameter, Resource, TemplateBuilder, Value};
//!
//! let mut builder = TemplateBuilder::new();
//! let domain = builder
//!     .declare_parameter(Parameter::string("DomainName").default_value(""))
//!     .unwrap();
//! let has_domain = builder
//!     .declare_guard("HasDomain", Condition::not_equals(&domain, ""))
//!     .unwrap();
//! builder
//!     .declare_resource(
//!         Resource::new("Listener", "AWS::ElasticLoadBalancingV2::Listener")
//!             .property("Port", has_domain.select(443i64, 80i64))
//!             .property("Certificates", has_domain.select(Value::list([&domain]), OMIT)),
//!     )
//!     .unwrap();
//! let document = builder.render().unwrap();
//! assert!(document.to_json().unwrap().contains("Fn::If"));
//! ```

pub use builder::TemplateBuilder;
pub use error::TemplateError;
pub use plan::{MASKED, ParameterValues, Plan, PlanAction, PlannedOutput, PlannedResource};
pub use settings::{DEFAULT_FORMAT_VERSION, GuardConsistency, TemplateSettings};
pub use traits::{Link, Referencing};
pub use types::*;

mod builder;
mod error;
pub mod loader;
mod plan;
mod settings;
mod traits;
mod types;
