use serde::Deserialize;

use crate::error::TemplateError;
use crate::plan::ParameterValues;
use crate::settings::TemplateSettings;

/// Parse and validate builder settings from JSON text.
///
/// Missing keys take their defaults.
///
/// Example:
/// ```rust
/// use stackform_core::loader::load_settings;
/// use stackform_core::GuardConsistency;
/// let settings = load_settings(r#"{"description": "Database stack", "guard_consistency": "deny"}"#).unwrap();
/// assert_eq!(settings.format_version, "2010-09-09");
/// assert_eq!(settings.guard_consistency, GuardConsistency::Deny);
/// ```
pub fn load_settings(text: &str) -> Result<TemplateSettings, TemplateError> {
    let settings: TemplateSettings = serde_json::from_str(text)?;
    settings.validate()?;
    Ok(settings)
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterEntry {
    parameter_key: String,
    parameter_value: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParameterFile {
    Entries(Vec<ParameterEntry>),
    Map(ParameterValues),
}

/// Parse deploy-time parameter values.
///
/// Accepts either a plain `{"Name": "value"}` object or the list form used by
/// the provisioning command line, `[{"ParameterKey": .., "ParameterValue": ..}]`.
pub fn load_parameter_values(text: &str) -> Result<ParameterValues, TemplateError> {
    match serde_json::from_str::<ParameterFile>(text) {
        Ok(ParameterFile::Map(values)) => Ok(values),
        Ok(ParameterFile::Entries(entries)) => {
            let mut values = ParameterValues::new();
            for entry in entries {
                let value = entry.parameter_value.ok_or_else(|| {
                    TemplateError::InvalidFormat(format!(
                        "parameter '{}' has no ParameterValue",
                        entry.parameter_key
                    ))
                })?;
                if values.insert(entry.parameter_key.clone(), value).is_some() {
                    return Err(TemplateError::InvalidFormat(format!(
                        "parameter '{}' is given more than once",
                        entry.parameter_key
                    )));
                }
            }
            Ok(values)
        }
        Err(_) => Err(TemplateError::InvalidFormat(
            "expected an object of parameter values or a list of ParameterKey/ParameterValue entries"
                .to_string(),
        )),
    }
}
