//! Stack outputs.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::traits::{Link, Referencing};

use super::logical_id::GuardRef;
use super::value::Value;

/// A value published by the stack, optionally exported for other stacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    name: String,
    value: Value,
    description: Option<String>,
    guard: Option<GuardRef>,
    export_name: Option<Value>,
}

impl Output {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Output {
            name: name.into(),
            value: value.into(),
            description: None,
            guard: None,
            export_name: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn guarded_by(mut self, guard: &GuardRef) -> Self {
        self.guard = Some(guard.clone());
        self
    }

    pub fn export(mut self, name: impl Into<Value>) -> Self {
        self.export_name = Some(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn guard(&self) -> Option<&GuardRef> {
        self.guard.as_ref()
    }

    pub fn export_name(&self) -> Option<&Value> {
        self.export_name.as_ref()
    }
}

impl Referencing for Output {
    fn collect_links<'a>(&'a self, out: &mut Vec<Link<'a>>) {
        if let Some(guard) = &self.guard {
            out.push(Link::Guard(guard.name()));
        }
        self.value.collect_links(out);
        if let Some(export) = &self.export_name {
            export.collect_links(out);
        }
    }
}

struct Export<'a>(&'a Value);

impl Serialize for Export<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(Some(1))?;
        map.serialize_entry("Name", self.0)?;
        map.end()
    }
}

impl Serialize for Output {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(None)?;
        if let Some(description) = &self.description {
            map.serialize_entry("Description", description)?;
        }
        if let Some(guard) = &self.guard {
            map.serialize_entry("Condition", guard.name())?;
        }
        map.serialize_entry("Value", &self.value)?;
        if let Some(export) = &self.export_name {
            map.serialize_entry("Export", &Export(export))?;
        }
        map.end()
    }
}
