//! Declaration namespaces and the document sections that hold them.
//!
//! This module centralizes the section names of the rendered template so the
//! rest of the crate never spells them out by hand.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// The independent namespaces a declaration can be registered in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Namespace {
    /// Deploy-time inputs (e.g. `DatabaseClass`)
    Parameter,
    /// Named conditions (e.g. `DatabaseCondition`)
    Guard,
    /// Units of infrastructure (e.g. `PostgreSQL`)
    Resource,
    /// Values exported from the stack
    Output,
}

impl Namespace {
    /// Top-level key of the rendered document holding this namespace.
    pub fn section(&self) -> &'static str {
        match self {
            Self::Parameter => "Parameters",
            Self::Guard => "Conditions",
            Self::Resource => "Resources",
            Self::Output => "Outputs",
        }
    }

    /// Whether names in `other` collide with names in `self`.
    ///
    /// Parameters and resources are both targets of `Ref`, so they share one
    /// symbol space even though they are declared separately.
    pub fn shares_symbols_with(&self, other: Namespace) -> bool {
        matches!(
            (self, other),
            (Self::Parameter, Self::Resource) | (Self::Resource, Self::Parameter)
        )
    }
}
