//! Local preview of a rendered document against deploy-time parameter values.
//!
//! Rendering never evaluates guards; the provisioning service does that at
//! deploy time. A [`Plan`] runs the same evaluation locally so callers can see
//! which resources a given set of values would create and what their fields
//! resolve to. The document itself is never modified.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};
use strum_macros::Display;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::error::TemplateError;
use crate::types::{
    Condition, Document, GuardRef, Namespace, Operand, ParameterRef, ParameterType, Reference,
    Value,
};

/// Shown in place of `no_echo` parameter values.
pub const MASKED: &str = "****";

/// Parameter values supplied at deploy time, keyed by parameter name.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ParameterValues(BTreeMap<String, String>);

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a value, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Values may be secrets; only the names are printed.
impl Debug for ParameterValues {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display)]
pub enum PlanAction {
    Create,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedResource {
    pub name: String,
    pub kind: String,
    pub action: PlanAction,
    /// Resolved fields; omitted fields are absent. Empty when skipped.
    pub properties: Map<String, Json>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedOutput {
    pub name: String,
    pub action: PlanAction,
    pub value: Option<Json>,
}

/// The outcome of evaluating a document against one set of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    guards: Vec<(String, bool)>,
    resources: Vec<PlannedResource>,
    outputs: Vec<PlannedOutput>,
    warnings: Vec<String>,
}

impl Plan {
    pub fn guard(&self, name: &str) -> Option<bool> {
        self.guards
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| *value)
    }

    pub fn resources(&self) -> &[PlannedResource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn is_created(&self, name: &str) -> bool {
        self.resource(name)
            .is_some_and(|r| r.action == PlanAction::Create)
    }

    pub fn created(&self) -> impl Iterator<Item = &PlannedResource> {
        self.resources
            .iter()
            .filter(|r| r.action == PlanAction::Create)
    }

    pub fn outputs(&self) -> &[PlannedOutput] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&PlannedOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// References from created items to skipped resources.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

struct Scope<'a> {
    document: &'a Document,
    values: HashMap<&'a str, &'a str>,
    guards: HashMap<&'a str, bool>,
    created: HashMap<&'a str, bool>,
}

impl<'a> Scope<'a> {
    fn operand(&self, operand: &'a Operand) -> Result<&'a str, TemplateError> {
        match operand {
            Operand::Literal(s) => Ok(s),
            Operand::Parameter(p) => self.value(p),
        }
    }

    fn value(&self, parameter: &ParameterRef) -> Result<&'a str, TemplateError> {
        self.values
            .get(parameter.name())
            .copied()
            .ok_or_else(|| TemplateError::MissingValue(parameter.name().to_string()))
    }

    fn guard(&self, guard: &GuardRef) -> Result<bool, TemplateError> {
        self.guards
            .get(guard.name())
            .copied()
            .ok_or_else(|| TemplateError::UnknownGuard {
                from: "plan".to_string(),
                guard: guard.name().to_string(),
            })
    }

    /// Evaluate a condition. `And` stops at the first false operand and `Or`
    /// at the first true one.
    fn evaluate(&self, condition: &'a Condition) -> Result<bool, TemplateError> {
        match condition {
            Condition::Equals(left, right) => Ok(self.operand(left)? == self.operand(right)?),
            Condition::Not(inner) => Ok(!self.evaluate(inner)?),
            Condition::And(items) => {
                for item in items {
                    if !self.evaluate(item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(items) => {
                for item in items {
                    if self.evaluate(item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Guard(g) => self.guard(g),
        }
    }

    fn parameter_json(&self, parameter: &ParameterRef) -> Result<Json, TemplateError> {
        let raw = self.value(parameter)?;
        let declared = self
            .document
            .parameter(parameter.name())
            .ok_or_else(|| TemplateError::MissingValue(parameter.name().to_string()))?;

        if declared.is_no_echo() {
            return Ok(json!(MASKED));
        }
        Ok(match declared.kind() {
            ParameterType::CommaDelimitedList | ParameterType::NumberList => {
                Json::Array(raw.split(',').map(|s| json!(s)).collect())
            }
            ParameterType::String | ParameterType::Number => json!(raw),
        })
    }

    fn note_target(&self, target: &'a str, dangling: &mut Vec<&'a str>) {
        if self.created.get(target) == Some(&false) && !dangling.contains(&target) {
            dangling.push(target);
        }
    }

    /// Resolve a field value. `None` means the field is absent.
    fn resolve(
        &self,
        value: &'a Value,
        dangling: &mut Vec<&'a str>,
    ) -> Result<Option<Json>, TemplateError> {
        let resolved = match value {
            Value::String(s) => json!(s),
            Value::Integer(n) => json!(n),
            Value::Bool(b) => json!(b),
            Value::List(items) => Json::Array(self.resolve_all(items, dangling)?),
            Value::Object(fields) => {
                let mut map = Map::new();
                for (key, field) in fields {
                    if let Some(v) = self.resolve(field, dangling)? {
                        map.insert(key.clone(), v);
                    }
                }
                Json::Object(map)
            }
            Value::Ref(Reference::Parameter(p)) => self.parameter_json(p)?,
            Value::Ref(Reference::Resource(r)) => {
                self.note_target(r.name(), dangling);
                json!({"Ref": r.name()})
            }
            Value::Ref(Reference::Pseudo(p)) => json!({"Ref": p.to_string()}),
            Value::GetAtt {
                resource,
                attribute,
            } => {
                self.note_target(resource.name(), dangling);
                json!({"Fn::GetAtt": [resource.name(), attribute]})
            }
            Value::Join { delimiter, parts } => {
                let parts = self.resolve_all(parts, dangling)?;
                let strings: Option<Vec<&str>> = parts.iter().map(Json::as_str).collect();
                match strings {
                    Some(strings) => json!(strings.join(delimiter.as_str())),
                    None => json!({"Fn::Join": [delimiter, parts]}),
                }
            }
            Value::Select {
                guard,
                on_true,
                on_false,
            } => {
                let branch = if self.guard(guard)? { on_true } else { on_false };
                return self.resolve(branch, dangling);
            }
            Value::Omit => return Ok(None),
        };
        Ok(Some(resolved))
    }

    fn resolve_all(
        &self,
        items: &'a [Value],
        dangling: &mut Vec<&'a str>,
    ) -> Result<Vec<Json>, TemplateError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(v) = self.resolve(item, dangling)? {
                out.push(v);
            }
        }
        Ok(out)
    }
}

impl Document {
    /// Evaluate this document against deploy-time `values`.
    ///
    /// Parameters without a supplied value fall back to their default. Values
    /// of `no_echo` parameters are masked in the result.
    pub fn plan(&self, values: &ParameterValues) -> Result<Plan, TemplateError> {
        if let Some(unknown) = values.names().find(|name| self.parameter(name).is_none()) {
            return Err(TemplateError::UnknownReference {
                from: "parameter values".to_string(),
                namespace: Namespace::Parameter,
                target: unknown.to_string(),
            });
        }

        let mut scope = Scope {
            document: self,
            values: HashMap::new(),
            guards: HashMap::new(),
            created: HashMap::new(),
        };

        for parameter in &self.parameters {
            let value = match values.get(parameter.name()) {
                Some(supplied) => {
                    parameter.validate_value(supplied)?;
                    supplied
                }
                None => parameter
                    .effective_default()
                    .ok_or_else(|| TemplateError::MissingValue(parameter.name().to_string()))?,
            };
            scope.values.insert(parameter.name(), value);
        }

        let mut guards = Vec::with_capacity(self.guards.len());
        for guard in &self.guards {
            let holds = scope.evaluate(guard.condition())?;
            debug!(event = "Plan", phase = "Guard", name = guard.name().name(), holds);
            scope.guards.insert(guard.name().name(), holds);
            guards.push((guard.name().name().to_string(), holds));
        }

        for resource in &self.resources {
            let created = match resource.guard() {
                Some(g) => scope.guard(g)?,
                None => true,
            };
            scope.created.insert(resource.name(), created);
        }

        let mut warnings = Vec::new();
        let mut resources = Vec::with_capacity(self.resources.len());
        for resource in &self.resources {
            let mut planned = PlannedResource {
                name: resource.name().to_string(),
                kind: resource.kind().to_string(),
                action: PlanAction::Skip,
                properties: Map::new(),
            };
            if scope.created.get(resource.name()) == Some(&true) {
                planned.action = PlanAction::Create;
                let mut dangling = Vec::new();
                for dep in resource.dependencies() {
                    scope.note_target(dep.name(), &mut dangling);
                }
                for (key, value) in resource.properties() {
                    if let Some(v) = scope.resolve(value, &mut dangling)? {
                        planned.properties.insert(key.clone(), v);
                    }
                }
                warnings.extend(dangling.into_iter().map(|target| {
                    format!("resource '{}' references skipped resource '{target}'", resource.name())
                }));
            }
            resources.push(planned);
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let created = match output.guard() {
                Some(g) => scope.guard(g)?,
                None => true,
            };
            let mut dangling = Vec::new();
            let value = if created {
                scope.resolve(output.value(), &mut dangling)?
            } else {
                None
            };
            warnings.extend(dangling.into_iter().map(|target| {
                format!("output '{}' references skipped resource '{target}'", output.name())
            }));
            outputs.push(PlannedOutput {
                name: output.name().to_string(),
                action: if created { PlanAction::Create } else { PlanAction::Skip },
                value,
            });
        }

        for warning in &warnings {
            warn!(event = "Plan", phase = "Reference", "{warning}");
        }

        let plan = Plan {
            guards,
            resources,
            outputs,
            warnings,
        };
        info!(
            event = "Plan",
            phase = "Result",
            created = plan.created().count(),
            skipped = plan.resources.len() - plan.created().count()
        );
        Ok(plan)
    }
}
