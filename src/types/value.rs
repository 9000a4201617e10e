//! Field values for resources and outputs, rendered as template intrinsics.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::traits::{Link, Referencing};

use super::logical_id::{GuardRef, ParameterRef, ResourceRef};

/// Parameters supplied by the provisioning service; they never need declaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum Pseudo {
    #[strum(serialize = "AWS::AccountId")]
    AccountId,
    #[strum(serialize = "AWS::NotificationARNs")]
    NotificationArns,
    #[strum(serialize = "AWS::Partition")]
    Partition,
    #[strum(serialize = "AWS::Region")]
    Region,
    #[strum(serialize = "AWS::StackId")]
    StackId,
    #[strum(serialize = "AWS::StackName")]
    StackName,
    #[strum(serialize = "AWS::URLSuffix")]
    UrlSuffix,
}

/// The target of a `Ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Parameter(ParameterRef),
    Resource(ResourceRef),
    Pseudo(Pseudo),
}

impl Reference {
    /// The name rendered into the `Ref`.
    pub fn name(&self) -> &str {
        match self {
            Reference::Parameter(p) => p.name(),
            Reference::Resource(r) => r.name(),
            Reference::Pseudo(p) => p.as_ref(),
        }
    }
}

/// The value of a resource or output field.
///
/// References are kept symbolic; they are rendered as names and resolved by
/// the provisioning service at deploy time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    String(String),
    Integer(i64),
    Bool(bool),
    List(Vec<Value>),
    /// Ordered field mapping, e.g. an ingress rule
    Object(Vec<(String, Value)>),
    Ref(Reference),
    GetAtt {
        resource: ResourceRef,
        attribute: String,
    },
    Join {
        delimiter: String,
        parts: Vec<Value>,
    },
    /// Picks a branch depending on a guard, evaluated at deploy time
    Select {
        guard: GuardRef,
        on_true: Box<Value>,
        on_false: Box<Value>,
    },
    /// The field is absent. Not the same as null or an empty string.
    Omit,
}

/// Render instruction meaning "this field is absent".
pub const OMIT: Value = Value::Omit;

impl Value {
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn get_att(resource: &ResourceRef, attribute: impl Into<String>) -> Self {
        Value::GetAtt {
            resource: resource.clone(),
            attribute: attribute.into(),
        }
    }

    pub fn join<I, V>(delimiter: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Join {
            delimiter: delimiter.into(),
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_omit(&self) -> bool {
        matches!(self, Value::Omit)
    }
}

impl GuardRef {
    /// Choose between two values depending on this guard at deploy time.
    ///
    /// Either branch may be [`OMIT`], which drops the field when chosen.
    pub fn select(&self, on_true: impl Into<Value>, on_false: impl Into<Value>) -> Value {
        Value::Select {
            guard: self.clone(),
            on_true: Box::new(on_true.into()),
            on_false: Box::new(on_false.into()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<&ParameterRef> for Value {
    fn from(p: &ParameterRef) -> Self {
        Value::Ref(Reference::Parameter(p.clone()))
    }
}

impl From<&ResourceRef> for Value {
    fn from(r: &ResourceRef) -> Self {
        Value::Ref(Reference::Resource(r.clone()))
    }
}

impl From<Pseudo> for Value {
    fn from(p: Pseudo) -> Self {
        Value::Ref(Reference::Pseudo(p))
    }
}

impl Referencing for Value {
    fn collect_links<'a>(&'a self, out: &mut Vec<Link<'a>>) {
        match self {
            Value::String(_) | Value::Integer(_) | Value::Bool(_) | Value::Omit => {}
            Value::List(items) => items.iter().for_each(|v| v.collect_links(out)),
            Value::Object(fields) => fields.iter().for_each(|(_, v)| v.collect_links(out)),
            Value::Ref(Reference::Parameter(p)) => out.push(Link::Parameter(p.name())),
            Value::Ref(Reference::Resource(r)) => out.push(Link::Resource(r.name())),
            Value::Ref(Reference::Pseudo(_)) => {}
            Value::GetAtt { resource, .. } => out.push(Link::Resource(resource.name())),
            Value::Join { parts, .. } => parts.iter().for_each(|v| v.collect_links(out)),
            Value::Select {
                guard,
                on_true,
                on_false,
            } => {
                out.push(Link::Guard(guard.name()));
                on_true.collect_links(out);
                on_false.collect_links(out);
            }
        }
    }
}

/// Serializes a sequence, leaving out omitted elements.
pub(crate) struct Present<'a>(pub(crate) &'a [Value]);

impl Serialize for Present<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_seq(self.0.iter().filter(|v| !v.is_omit()))
    }
}

/// Serializes a field mapping, leaving out omitted fields.
pub(crate) struct PresentFields<'a>(pub(crate) &'a [(String, Value)]);

impl Serialize for PresentFields<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_map(
            self.0
                .iter()
                .filter(|(_, v)| !v.is_omit())
                .map(|(k, v)| (k, v)),
        )
    }
}

/// Serializes a single-key intrinsic function object such as `{"Ref": "X"}`.
pub(crate) fn intrinsic<S, T>(ser: S, function: &str, body: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = ser.serialize_map(Some(1))?;
    map.serialize_entry(function, body)?;
    map.end()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => ser.serialize_str(s),
            Value::Integer(n) => ser.serialize_i64(*n),
            Value::Bool(b) => ser.serialize_bool(*b),
            Value::List(items) => Present(items).serialize(ser),
            Value::Object(fields) => PresentFields(fields).serialize(ser),
            Value::Ref(reference) => intrinsic(ser, "Ref", reference.name()),
            Value::GetAtt {
                resource,
                attribute,
            } => intrinsic(ser, "Fn::GetAtt", &[resource.name(), attribute.as_str()]),
            Value::Join { delimiter, parts } => {
                intrinsic(ser, "Fn::Join", &(delimiter, Present(parts)))
            }
            Value::Select {
                guard,
                on_true,
                on_false,
            } => intrinsic(
                ser,
                "Fn::If",
                &(guard.name(), on_true.as_ref(), on_false.as_ref()),
            ),
            Value::Omit => intrinsic(ser, "Ref", "AWS::NoValue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use strum::IntoEnumIterator;
    use yare::parameterized;

    #[parameterized(
        string = { Value::from("postgres"), json!("postgres") },
        integer = { Value::Integer(5432), json!(5432) },
        boolean = { Value::from(true), json!(true) },
        parameter_ref = { Value::from(&ParameterRef::new("DatabaseName")), json!({"Ref": "DatabaseName"}) },
        resource_ref = { Value::from(&ResourceRef::new("Vpc")), json!({"Ref": "Vpc"}) },
        pseudo_ref = { Value::from(Pseudo::Region), json!({"Ref": "AWS::Region"}) },
        omit = { OMIT, json!({"Ref": "AWS::NoValue"}) },
        get_att = {
            Value::get_att(&ResourceRef::new("PostgreSQL"), "Endpoint.Address"),
            json!({"Fn::GetAtt": ["PostgreSQL", "Endpoint.Address"]})
        },
    )]
    fn test_value_serialization(value: Value, expected: serde_json::Value) {
        assert_eq!(serde_json::to_value(&value).unwrap(), expected);
    }

    #[test]
    fn test_select_with_omit_branch() {
        let guard = GuardRef::new("NoAlternateNames");
        let value = guard.select(OMIT, Value::from(&ParameterRef::new("AlternateNames")));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"Fn::If": ["NoAlternateNames", {"Ref": "AWS::NoValue"}, {"Ref": "AlternateNames"}]})
        );
    }

    #[test]
    fn test_omit_is_dropped_from_objects_and_lists() {
        let value = Value::object([
            ("IpProtocol", Value::from("tcp")),
            ("Description", OMIT),
            ("Ports", Value::list([Value::from("5432"), OMIT])),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"IpProtocol": "tcp", "Ports": ["5432"]})
        );
    }

    #[test]
    fn test_object_keeps_field_order() {
        let value = Value::object([
            ("ToPort", Value::from("5432")),
            ("FromPort", Value::from("5432")),
            ("CidrIp", Value::from("10.0.0.0/24")),
        ]);
        let rendered = serde_json::to_string(&value).unwrap();
        assert_eq!(
            rendered,
            r#"{"ToPort":"5432","FromPort":"5432","CidrIp":"10.0.0.0/24"}"#
        );
    }

    #[test]
    fn test_join_serialization() {
        let value = Value::join(
            ".",
            [Value::from("db"), Value::from(Pseudo::Region), Value::from("internal")],
        );
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"Fn::Join": [".", ["db", {"Ref": "AWS::Region"}, "internal"]]})
        );
    }

    #[test]
    fn test_value_links() {
        let value = Value::object([
            ("DBName", Value::from(&ParameterRef::new("DatabaseName"))),
            ("Endpoint", Value::get_att(&ResourceRef::new("PostgreSQL"), "Endpoint.Port")),
            ("Region", Value::from(Pseudo::Region)),
            (
                "Names",
                GuardRef::new("HasNames").select(Value::from(&ParameterRef::new("Names")), OMIT),
            ),
        ]);
        assert_eq!(
            value.links(),
            vec![
                Link::Parameter("DatabaseName"),
                Link::Resource("PostgreSQL"),
                Link::Guard("HasNames"),
                Link::Parameter("Names"),
            ]
        );
    }

    #[test]
    fn test_pseudo_names_round_trip() {
        for pseudo in Pseudo::iter() {
            let name = pseudo.as_ref();
            assert!(name.starts_with("AWS::"));
            assert_eq!(Pseudo::from_str(name).unwrap(), pseudo);
        }
    }
}
