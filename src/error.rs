use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Namespace;

/// Placeholder used wherever a `no_echo` value would otherwise be printed.
pub(crate) const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TemplateError {
    #[error("duplicate {namespace} name '{name}'")]
    DuplicateName { namespace: Namespace, name: String },

    #[error("{from} references undeclared {namespace} '{target}'")]
    UnknownReference {
        from: String,
        namespace: Namespace,
        target: String,
    },

    #[error("{from} uses unregistered guard '{guard}'")]
    UnknownGuard { from: String, guard: String },

    #[error("{name} violates constraint: {constraint}")]
    InvalidConstraint { name: String, constraint: String },

    #[error("invalid {namespace} name '{name}': {reason}")]
    InvalidName {
        namespace: Namespace,
        name: String,
        reason: String,
    },

    #[error(
        "{from} references '{target}' guarded by '{guard}', which does not cover the reference"
    )]
    InconsistentGuard {
        from: String,
        target: String,
        guard: String,
    },

    #[error("no value supplied for parameter '{0}' and it has no default")]
    MissingValue(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl TemplateError {
    pub(crate) fn constraint(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        TemplateError::InvalidConstraint {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        TemplateError::InvalidFormat(err.to_string())
    }
}
