//! Deploy-time inputs and the constraints their values must satisfy.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use itertools::Itertools;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::{REDACTED, TemplateError};

/// The wire types a parameter can be declared with.
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
    AsRefStr,
)]
pub enum ParameterType {
    #[default]
    String,
    Number,
    #[serde(rename = "List<Number>")]
    #[strum(serialize = "List<Number>")]
    NumberList,
    CommaDelimitedList,
}

impl ParameterType {
    /// Types that accept `MinValue` / `MaxValue`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::NumberList)
    }

    /// Types that accept `MinLength` / `MaxLength` / `AllowedPattern`.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::CommaDelimitedList)
    }
}

/// Length, range and pattern constraints on a parameter value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Must match the whole value.
    pub allowed_pattern: Option<String>,
}

impl Constraints {
    fn has_length(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }

    fn has_range(&self) -> bool {
        self.min_value.is_some() || self.max_value.is_some()
    }
}

/// A named, typed input to the template.
///
/// Built with chained setters and registered with
/// [`crate::TemplateBuilder::declare_parameter`], which validates it.
#[derive(Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterType,
    default: Option<String>,
    description: Option<String>,
    allowed_values: Option<Vec<String>>,
    constraints: Constraints,
    constraint_description: Option<String>,
    no_echo: bool,
    absent: Option<String>,
    group: Option<String>,
    label: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Parameter {
            name: name.into(),
            kind,
            default: None,
            description: None,
            allowed_values: None,
            constraints: Constraints::default(),
            constraint_description: None,
            no_echo: false,
            absent: None,
            group: None,
            label: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Parameter::new(name, ParameterType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Parameter::new(name, ParameterType::Number)
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.constraints.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.constraints.max_length = Some(n);
        self
    }

    pub fn min_value(mut self, n: f64) -> Self {
        self.constraints.min_value = Some(n);
        self
    }

    pub fn max_value(mut self, n: f64) -> Self {
        self.constraints.max_value = Some(n);
        self
    }

    pub fn allowed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.allowed_pattern = Some(pattern.into());
        self
    }

    pub fn constraint_description(mut self, description: impl Into<String>) -> Self {
        self.constraint_description = Some(description.into());
        self
    }

    /// Never surface this parameter's value in logs, errors or previews.
    pub fn no_echo(mut self) -> Self {
        self.no_echo = true;
        self
    }

    /// Make the parameter optional, using `sentinel` as the "no value" marker.
    ///
    /// The sentinel is rendered first in the allowed values and becomes the
    /// default when no other default is set. It must still satisfy the type,
    /// length, range and pattern constraints.
    pub fn optional(mut self, sentinel: impl Into<String>) -> Self {
        self.absent = Some(sentinel.into());
        self
    }

    /// Console group the parameter is listed under.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Console label shown instead of the logical id.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterType {
        self.kind
    }

    pub fn is_no_echo(&self) -> bool {
        self.no_echo
    }

    /// The sentinel meaning "no value", for optional parameters.
    pub fn absent_value(&self) -> Option<&str> {
        self.absent.as_deref()
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The default rendered into the document.
    pub fn effective_default(&self) -> Option<&str> {
        self.default.as_deref().or(self.absent.as_deref())
    }

    /// The allowed values rendered into the document, sentinel first.
    pub fn effective_allowed_values(&self) -> Option<Vec<&str>> {
        let allowed = self.allowed_values.as_ref()?;
        let mut out: Vec<&str> = Vec::with_capacity(allowed.len() + 1);
        if let Some(sentinel) = self.absent.as_deref() {
            if !allowed.iter().any(|v| v == sentinel) {
                out.push(sentinel);
            }
        }
        out.extend(allowed.iter().map(String::as_str));
        Some(out)
    }

    /// Check the parameter's own definition, then its default.
    pub fn check_definition(&self) -> Result<(), TemplateError> {
        let c = &self.constraints;

        if self.allowed_values.as_ref().is_some_and(Vec::is_empty) {
            return Err(self.violation("AllowedValues must not be empty"));
        }
        if c.has_length() && !self.kind.is_textual() {
            return Err(self.violation(format!(
                "MinLength/MaxLength do not apply to {} parameters",
                self.kind
            )));
        }
        if c.allowed_pattern.is_some() && !self.kind.is_textual() {
            return Err(self.violation(format!(
                "AllowedPattern does not apply to {} parameters",
                self.kind
            )));
        }
        if c.has_range() && !self.kind.is_numeric() {
            return Err(self.violation(format!(
                "MinValue/MaxValue do not apply to {} parameters",
                self.kind
            )));
        }
        if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
            if min > max {
                return Err(self.violation(format!(
                    "MinLength {min} is greater than MaxLength {max}"
                )));
            }
        }
        for (label, bound) in [("MinValue", c.min_value), ("MaxValue", c.max_value)] {
            if bound.is_some_and(|n| !n.is_finite()) {
                return Err(self.violation(format!("{label} must be a finite number")));
            }
        }
        if let (Some(min), Some(max)) = (c.min_value, c.max_value) {
            if min > max {
                return Err(self.violation(format!(
                    "MinValue {min} is greater than MaxValue {max}"
                )));
            }
        }
        self.compiled_pattern()?;

        // The sentinel is rendered as an allowed value and possibly the default,
        // so it must still satisfy the type and the other constraints.
        if let Some(sentinel) = &self.absent {
            self.check_value("sentinel", sentinel)?;
        }
        if let Some(default) = &self.default {
            self.check_value("default", default)?;
        }
        Ok(())
    }

    /// Check a value supplied for this parameter against its constraints.
    pub fn validate_value(&self, value: &str) -> Result<(), TemplateError> {
        self.check_value("value", value)
    }

    /// How a value of this parameter may be shown in diagnostics.
    pub fn display_value(&self, value: &str) -> String {
        if self.no_echo {
            REDACTED.to_string()
        } else {
            format!("'{value}'")
        }
    }

    fn check_value(&self, what: &str, value: &str) -> Result<(), TemplateError> {
        let shown = self.display_value(value);

        if let Some(allowed) = self.effective_allowed_values() {
            if !allowed.contains(&value) {
                return Err(self.violation(format!(
                    "{what} {shown} is not one of the allowed values [{}]",
                    allowed.iter().join(", ")
                )));
            }
        }

        match self.kind {
            ParameterType::Number => self.check_number(what, &shown, value)?,
            ParameterType::NumberList => {
                for item in value.split(',') {
                    self.check_number(what, &shown, item)?;
                }
            }
            ParameterType::String | ParameterType::CommaDelimitedList => {
                self.check_length(what, &shown, value)?;
                if let Some(re) = self.compiled_pattern()? {
                    if !re.is_match(value) {
                        return Err(self.violation(format!(
                            "{what} {shown} does not match AllowedPattern '{}'",
                            self.constraints.allowed_pattern.as_deref().unwrap_or_default()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_number(&self, what: &str, shown: &str, value: &str) -> Result<(), TemplateError> {
        let n = value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.violation(format!("{what} {shown} is not a number")))?;

        if let Some(min) = self.constraints.min_value {
            if n < min {
                return Err(self.violation(format!("{what} {shown} is less than MinValue {min}")));
            }
        }
        if let Some(max) = self.constraints.max_value {
            if n > max {
                return Err(
                    self.violation(format!("{what} {shown} is greater than MaxValue {max}"))
                );
            }
        }
        Ok(())
    }

    fn check_length(&self, what: &str, shown: &str, value: &str) -> Result<(), TemplateError> {
        let len = value.chars().count();
        if let Some(min) = self.constraints.min_length {
            if len < min {
                return Err(self.violation(format!(
                    "{what} {shown} is shorter than MinLength {min}"
                )));
            }
        }
        if let Some(max) = self.constraints.max_length {
            if len > max {
                return Err(self.violation(format!(
                    "{what} {shown} is longer than MaxLength {max}"
                )));
            }
        }
        Ok(())
    }

    fn compiled_pattern(&self) -> Result<Option<Regex>, TemplateError> {
        let Some(pattern) = self.constraints.allowed_pattern.as_deref() else {
            return Ok(None);
        };
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Some)
            .map_err(|e| {
                self.violation(format!("AllowedPattern '{pattern}' is not a valid pattern: {e}"))
            })
    }

    fn violation(&self, constraint: impl Into<String>) -> TemplateError {
        let mut constraint = constraint.into();
        if let Some(description) = &self.constraint_description {
            constraint.push_str(&format!(" ({description})"));
        }
        TemplateError::constraint(format!("parameter '{}'", self.name), constraint)
    }
}

impl Debug for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let default = self
            .default
            .as_deref()
            .map(|d| if self.no_echo { REDACTED } else { d });
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &default)
            .field("allowed_values", &self.allowed_values)
            .field("constraints", &self.constraints)
            .field("no_echo", &self.no_echo)
            .field("absent", &self.absent)
            .finish_non_exhaustive()
    }
}

/// Renders whole numbers without a fractional part.
struct Bound(f64);

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < i64::MAX as f64 {
            ser.serialize_i64(self.0 as i64)
        } else {
            ser.serialize_f64(self.0)
        }
    }
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let c = &self.constraints;
        let mut map = ser.serialize_map(None)?;
        map.serialize_entry("Type", self.kind.as_ref())?;
        if let Some(default) = self.effective_default() {
            map.serialize_entry("Default", default)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("Description", description)?;
        }
        if let Some(allowed) = self.effective_allowed_values() {
            map.serialize_entry("AllowedValues", &allowed)?;
        }
        if let Some(pattern) = &c.allowed_pattern {
            map.serialize_entry("AllowedPattern", pattern)?;
        }
        if let Some(n) = c.min_length {
            map.serialize_entry("MinLength", &n)?;
        }
        if let Some(n) = c.max_length {
            map.serialize_entry("MaxLength", &n)?;
        }
        if let Some(n) = c.min_value {
            map.serialize_entry("MinValue", &Bound(n))?;
        }
        if let Some(n) = c.max_value {
            map.serialize_entry("MaxValue", &Bound(n))?;
        }
        if let Some(description) = &self.constraint_description {
            map.serialize_entry("ConstraintDescription", description)?;
        }
        if self.no_echo {
            map.serialize_entry("NoEcho", &true)?;
        }
        map.end()
    }
}
