//! Resource declarations: a unit of infrastructure and its fields.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::traits::{Link, Referencing};

use super::logical_id::{GuardRef, ResourceRef};
use super::value::{PresentFields, Value};

/// What the provisioning service does with a resource's data when the
/// resource is removed or replaced.
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
pub enum RetentionPolicy {
    Delete,
    Retain,
    Snapshot,
    RetainExceptOnCreate,
}

/// A named, typed unit of infrastructure.
///
/// The type (e.g. `AWS::RDS::DBInstance`) and field names are opaque strings
/// owned by the provisioning service and are rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    name: String,
    kind: String,
    properties: Vec<(String, Value)>,
    guard: Option<GuardRef>,
    deletion_policy: Option<RetentionPolicy>,
    update_replace_policy: Option<RetentionPolicy>,
    depends_on: Vec<ResourceRef>,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Resource {
            name: name.into(),
            kind: kind.into(),
            properties: Vec::new(),
            guard: None,
            deletion_policy: None,
            update_replace_policy: None,
            depends_on: Vec::new(),
        }
    }

    /// A resource holding durable state. Its deletion policy is set to
    /// [`RetentionPolicy::Snapshot`] and rendered explicitly; override it with
    /// [`Resource::deletion_policy`].
    pub fn durable(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Resource::new(name, kind).deletion_policy(RetentionPolicy::Snapshot)
    }

    /// Set a field. Setting the same field again replaces its value in place.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    /// Only create this resource when `guard` holds at deploy time.
    pub fn guarded_by(mut self, guard: &GuardRef) -> Self {
        self.guard = Some(guard.clone());
        self
    }

    pub fn deletion_policy(mut self, policy: RetentionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    pub fn update_replace_policy(mut self, policy: RetentionPolicy) -> Self {
        self.update_replace_policy = Some(policy);
        self
    }

    pub fn depends_on(mut self, resource: &ResourceRef) -> Self {
        if !self.depends_on.contains(resource) {
            self.depends_on.push(resource.clone());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn properties(&self) -> &[(String, Value)] {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn guard(&self) -> Option<&GuardRef> {
        self.guard.as_ref()
    }

    pub fn retention(&self) -> Option<RetentionPolicy> {
        self.deletion_policy
    }

    pub fn replacement_retention(&self) -> Option<RetentionPolicy> {
        self.update_replace_policy
    }

    pub fn dependencies(&self) -> &[ResourceRef] {
        &self.depends_on
    }
}

impl Referencing for Resource {
    fn collect_links<'a>(&'a self, out: &mut Vec<Link<'a>>) {
        if let Some(guard) = &self.guard {
            out.push(Link::Guard(guard.name()));
        }
        for dep in &self.depends_on {
            out.push(Link::Resource(dep.name()));
        }
        for (_, value) in &self.properties {
            value.collect_links(out);
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(None)?;
        map.serialize_entry("Type", &self.kind)?;
        if let Some(guard) = &self.guard {
            map.serialize_entry("Condition", guard.name())?;
        }
        if !self.depends_on.is_empty() {
            let names: Vec<&str> = self.depends_on.iter().map(|d| d.name()).collect();
            map.serialize_entry("DependsOn", &names)?;
        }
        if let Some(policy) = self.deletion_policy {
            map.serialize_entry("DeletionPolicy", policy.as_ref())?;
        }
        if let Some(policy) = self.update_replace_policy {
            map.serialize_entry("UpdateReplacePolicy", policy.as_ref())?;
        }
        if self.properties.iter().any(|(_, v)| !v.is_omit()) {
            map.serialize_entry("Properties", &PresentFields(&self.properties))?;
        }
        map.end()
    }
}
