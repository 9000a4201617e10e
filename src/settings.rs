//! Builder configuration.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::TemplateError;

/// The template format version emitted by default.
pub const DEFAULT_FORMAT_VERSION: &str = "2010-09-09";

/// Longest description the provisioning service accepts, in bytes.
pub const MAX_DESCRIPTION_BYTES: usize = 1024;

/// What to do when a resource references a guarded resource and its own
/// guard does not cover that guard.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GuardConsistency {
    Ignore,
    #[default]
    Warn,
    Deny,
}

/// Settings applied to one template build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TemplateSettings {
    pub format_version: String,
    pub description: Option<String>,
    pub guard_consistency: GuardConsistency,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        TemplateSettings {
            format_version: DEFAULT_FORMAT_VERSION.to_string(),
            description: None,
            guard_consistency: GuardConsistency::default(),
        }
    }
}

impl TemplateSettings {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_guard_consistency(mut self, mode: GuardConsistency) -> Self {
        self.guard_consistency = mode;
        self
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.format_version.is_empty() {
            return Err(TemplateError::constraint(
                "AWSTemplateFormatVersion",
                "must not be empty",
            ));
        }
        if let Some(description) = &self.description {
            if description.len() > MAX_DESCRIPTION_BYTES {
                return Err(TemplateError::constraint(
                    "Description",
                    format!(
                        "is {} bytes, longer than the {MAX_DESCRIPTION_BYTES} byte limit",
                        description.len()
                    ),
                ));
            }
        }
        Ok(())
    }
}
