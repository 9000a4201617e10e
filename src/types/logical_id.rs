//! Typed handles naming a declaration inside one namespace.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

use super::namespace::Namespace;

const MAX_LOGICAL_ID_LEN: usize = 255;

static LOGICAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

/// Ties a marker type to the namespace its handles live in.
pub trait NamespaceMarker {
    fn namespace() -> Namespace;
}

/// Marker type for parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterMarker {}

/// Marker type for guards
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardMarker {}

/// Marker type for resources
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceMarker {}

/// Marker type for outputs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputMarker {}

impl NamespaceMarker for ParameterMarker {
    fn namespace() -> Namespace {
        Namespace::Parameter
    }
}

impl NamespaceMarker for GuardMarker {
    fn namespace() -> Namespace {
        Namespace::Guard
    }
}

impl NamespaceMarker for ResourceMarker {
    fn namespace() -> Namespace {
        Namespace::Resource
    }
}

impl NamespaceMarker for OutputMarker {
    fn namespace() -> Namespace {
        Namespace::Output
    }
}

/// A logical id, typed by the namespace it points into.
///
/// Handles are returned by the builder's `declare_*` calls, but they can also be
/// constructed by name; whether the name is actually declared is checked when
/// the handle is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId<T> {
    name: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> LogicalId<T> {
    pub fn new(name: impl Into<String>) -> Self {
        LogicalId {
            name: name.into(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: NamespaceMarker> LogicalId<T> {
    pub fn namespace(&self) -> Namespace {
        T::namespace()
    }
}

impl<T> Display for LogicalId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

/// Handle to a declared parameter.
pub type ParameterRef = LogicalId<ParameterMarker>;

/// Handle to a registered guard.
pub type GuardRef = LogicalId<GuardMarker>;

/// Handle to a declared resource.
pub type ResourceRef = LogicalId<ResourceMarker>;

/// Handle to a declared output.
pub type OutputRef = LogicalId<OutputMarker>;

/// Check that `name` is a valid logical id: alphanumeric, 1 to 255 characters.
pub fn validate_logical_id(namespace: Namespace, name: &str) -> Result<(), TemplateError> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.len() > MAX_LOGICAL_ID_LEN {
        "must be at most 255 characters"
    } else if !LOGICAL_ID.is_match(name) {
        "must contain only ASCII letters and digits"
    } else {
        return Ok(());
    };

    Err(TemplateError::InvalidName {
        namespace,
        name: name.to_string(),
        reason: reason.to_string(),
    })
}
