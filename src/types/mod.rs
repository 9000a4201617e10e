//! Data model for template declarations.
//!
//! Rendered forms:
//! - Parameter reference: `{"Ref": "DatabaseClass"}`
//! - Guard: `{"Fn::Not": [{"Fn::Equals": [{"Ref": "DomainName"}, ""]}]}`
//! - Guard reuse inside another guard: `{"Condition": "HasCertificate"}`
//! - Selection: `{"Fn::If": ["HasCertificate", <on_true>, <on_false>]}`
//! - Omitted field: `{"Ref": "AWS::NoValue"}`, or dropped where it is a field
//!   of a mapping or an element of a list.
//!
//! Logical ids are alphanumeric. Parameters and resources share the `Ref`
//! symbol space; guards and outputs each have their own.

mod condition;
mod document;
mod logical_id;
mod namespace;
mod output;
mod parameter;
mod resource;
mod value;

pub use condition::{Condition, Guard, MAX_COMPOSITE_OPERANDS, MIN_COMPOSITE_OPERANDS, Operand};
pub use document::Document;
pub use logical_id::{
    GuardMarker, GuardRef, LogicalId, NamespaceMarker, OutputMarker, OutputRef, ParameterMarker,
    ParameterRef, ResourceMarker, ResourceRef, validate_logical_id,
};
pub use namespace::Namespace;
pub use output::Output;
pub use parameter::{Constraints, Parameter, ParameterType};
pub use resource::{Resource, RetentionPolicy};
pub use value::{OMIT, Pseudo, Reference, Value};
