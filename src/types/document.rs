//! The rendered, immutable template document.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::TemplateError;
use crate::settings::TemplateSettings;

use super::condition::{Condition, Guard};
use super::namespace::Namespace;
use super::output::Output;
use super::parameter::Parameter;
use super::resource::Resource;

const INTERFACE_KEY: &str = "AWS::CloudFormation::Interface";

/// The complete, ordered set of parameters, guards, resources and outputs
/// produced by one build.
///
/// Everything is kept in declaration order, so rendering the same declarations
/// always yields the same bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) settings: TemplateSettings,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) guards: Vec<Guard>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) outputs: Vec<Output>,
}

impl Document {
    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn guard(&self, name: &str) -> Option<&Condition> {
        self.guards
            .iter()
            .find(|g| g.name().name() == name)
            .map(Guard::condition)
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name() == name)
    }

    /// The document as a JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, TemplateError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The document as pretty-printed JSON text.
    pub fn to_json(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One entry of a named top-level section.
trait SectionEntry {
    type Body: Serialize;
    fn key(&self) -> &str;
    fn body(&self) -> &Self::Body;
}

impl SectionEntry for Parameter {
    type Body = Parameter;
    fn key(&self) -> &str {
        self.name()
    }
    fn body(&self) -> &Self::Body {
        self
    }
}

impl SectionEntry for Guard {
    type Body = Condition;
    fn key(&self) -> &str {
        self.name().name()
    }
    fn body(&self) -> &Self::Body {
        self.condition()
    }
}

impl SectionEntry for Resource {
    type Body = Resource;
    fn key(&self) -> &str {
        self.name()
    }
    fn body(&self) -> &Self::Body {
        self
    }
}

impl SectionEntry for Output {
    type Body = Output;
    fn key(&self) -> &str {
        self.name()
    }
    fn body(&self) -> &Self::Body {
        self
    }
}

struct Section<'a, T>(&'a [T]);

impl<T: SectionEntry> Serialize for Section<'_, T> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_map(self.0.iter().map(|entry| (entry.key(), entry.body())))
    }
}

#[derive(Serialize)]
struct Text<'a> {
    default: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterGroup<'a> {
    label: Text<'a>,
    parameters: Vec<&'a str>,
}

/// Console metadata: parameter groups in first-seen order, and labels.
struct Interface<'a> {
    groups: Vec<ParameterGroup<'a>>,
    labels: Vec<(&'a str, Text<'a>)>,
}

impl<'a> Interface<'a> {
    fn from_parameters(parameters: &'a [Parameter]) -> Option<Self> {
        let mut groups: Vec<ParameterGroup<'a>> = Vec::new();
        let mut labels = Vec::new();

        for parameter in parameters {
            if let Some(group) = parameter.group_name() {
                match groups.iter_mut().find(|g| g.label.default == group) {
                    Some(existing) => existing.parameters.push(parameter.name()),
                    None => groups.push(ParameterGroup {
                        label: Text { default: group },
                        parameters: vec![parameter.name()],
                    }),
                }
            }
            if let Some(label) = parameter.label_text() {
                labels.push((parameter.name(), Text { default: label }));
            }
        }

        if groups.is_empty() && labels.is_empty() {
            None
        } else {
            Some(Interface { groups, labels })
        }
    }
}

struct Labels<'a, 'b>(&'b [(&'a str, Text<'a>)]);

impl Serialize for Labels<'_, '_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_map(self.0.iter().map(|(name, text)| (name, text)))
    }
}

impl Serialize for Interface<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(None)?;
        if !self.groups.is_empty() {
            map.serialize_entry("ParameterGroups", &self.groups)?;
        }
        if !self.labels.is_empty() {
            map.serialize_entry("ParameterLabels", &Labels(&self.labels))?;
        }
        map.end()
    }
}

struct Metadata<'a>(Interface<'a>);

impl Serialize for Metadata<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(Some(1))?;
        map.serialize_entry(INTERFACE_KEY, &self.0)?;
        map.end()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(None)?;
        map.serialize_entry("AWSTemplateFormatVersion", &self.settings.format_version)?;
        if let Some(description) = &self.settings.description {
            map.serialize_entry("Description", description)?;
        }
        if let Some(interface) = Interface::from_parameters(&self.parameters) {
            map.serialize_entry("Metadata", &Metadata(interface))?;
        }
        if !self.parameters.is_empty() {
            map.serialize_entry(Namespace::Parameter.section(), &Section(&self.parameters))?;
        }
        if !self.guards.is_empty() {
            map.serialize_entry(Namespace::Guard.section(), &Section(&self.guards))?;
        }
        map.serialize_entry(Namespace::Resource.section(), &Section(&self.resources))?;
        if !self.outputs.is_empty() {
            map.serialize_entry(Namespace::Output.section(), &Section(&self.outputs))?;
        }
        map.end()
    }
}
