//! Guard conditions: boolean expressions over parameter values.
//!
//! Conditions are never evaluated while building. They are rendered into the
//! document's `Conditions` section and evaluated by the provisioning service at
//! deploy time; [`crate::Document::plan`] can evaluate them locally for preview.

use std::ops::Not;

use serde::{Serialize, Serializer};

use crate::traits::{Link, Referencing};

use super::logical_id::{GuardRef, ParameterRef};
use super::resource::Resource;
use super::value::intrinsic;

/// Most operands `Fn::And` and `Fn::Or` accept.
pub const MAX_COMPOSITE_OPERANDS: usize = 10;
/// Fewest operands `Fn::And` and `Fn::Or` accept.
pub const MIN_COMPOSITE_OPERANDS: usize = 2;

/// One side of an equality test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Parameter(ParameterRef),
    Literal(String),
}

impl From<&ParameterRef> for Operand {
    fn from(p: &ParameterRef) -> Self {
        Operand::Parameter(p.clone())
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Literal(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Literal(s)
    }
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self {
            Operand::Parameter(p) => intrinsic(ser, "Ref", p.name()),
            Operand::Literal(s) => ser.serialize_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Equals(Operand, Operand),
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    /// Reuse of another registered guard
    Guard(GuardRef),
}

impl Condition {
    pub fn equals(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Condition::Equals(left.into(), right.into())
    }

    pub fn not_equals(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Condition::equals(left, right).negate()
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    pub fn guard(guard: &GuardRef) -> Self {
        Condition::Guard(guard.clone())
    }

    /// Whether this condition, when true, guarantees `guard` is true.
    ///
    /// Only syntactic coverage is recognized: the guard itself, or a
    /// conjunction containing it. `lookup` resolves guard names to their
    /// registered conditions so chains of guard references are followed.
    pub fn implies<'c, F>(&self, guard: &GuardRef, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<&'c Condition>,
    {
        match self {
            Condition::Guard(g) if g == guard => true,
            Condition::Guard(g) => lookup(g.name()).is_some_and(|c| c.implies(guard, lookup)),
            Condition::And(items) => items.iter().any(|c| c.implies(guard, lookup)),
            _ => false,
        }
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl Referencing for Condition {
    fn collect_links<'a>(&'a self, out: &mut Vec<Link<'a>>) {
        match self {
            Condition::Equals(left, right) => {
                for operand in [left, right] {
                    if let Operand::Parameter(p) = operand {
                        out.push(Link::Parameter(p.name()));
                    }
                }
            }
            Condition::Not(inner) => inner.collect_links(out),
            Condition::And(items) | Condition::Or(items) => {
                items.iter().for_each(|c| c.collect_links(out))
            }
            Condition::Guard(g) => out.push(Link::Guard(g.name())),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self {
            Condition::Equals(left, right) => intrinsic(ser, "Fn::Equals", &(left, right)),
            Condition::Not(inner) => intrinsic(ser, "Fn::Not", &[inner.as_ref()]),
            Condition::And(items) => intrinsic(ser, "Fn::And", items),
            Condition::Or(items) => intrinsic(ser, "Fn::Or", items),
            Condition::Guard(g) => intrinsic(ser, "Condition", g.name()),
        }
    }
}

/// A registered, named condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guard {
    name: GuardRef,
    condition: Condition,
}

impl Guard {
    pub fn new(name: GuardRef, condition: Condition) -> Self {
        Guard { name, condition }
    }

    pub fn name(&self) -> &GuardRef {
        &self.name
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

impl GuardRef {
    /// Attach this guard to `resource`, so it is only created when the guard holds.
    pub fn attach(&self, resource: Resource) -> Resource {
        resource.guarded_by(self)
    }
}
