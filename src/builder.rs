use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::TemplateError;
use crate::settings::{GuardConsistency, TemplateSettings};
use crate::traits::{Link, Referencing};
use crate::types::{
    Condition, Document, Guard, GuardRef, Namespace, Operand, Output, OutputRef, Parameter,
    ParameterRef, Reference, Resource, ResourceRef, Value, validate_logical_id,
};
use crate::types::{MAX_COMPOSITE_OPERANDS, MIN_COMPOSITE_OPERANDS};

/// Accumulates declarations and renders them into one [`Document`].
///
/// Every declaration is validated when it is made: names must be unique,
/// references must point at something already declared, and defaults and
/// literals must satisfy their parameter's constraints. A failed declaration
/// leaves the builder unchanged.
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    settings: TemplateSettings,
    parameters: Vec<Parameter>,
    guards: Vec<Guard>,
    resources: Vec<Resource>,
    outputs: Vec<Output>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: TemplateSettings) -> Result<Self, TemplateError> {
        settings.validate()?;
        Ok(TemplateBuilder {
            settings,
            ..Self::default()
        })
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn declare_parameter(&mut self, parameter: Parameter) -> Result<ParameterRef, TemplateError> {
        self.check_name(Namespace::Parameter, parameter.name())?;
        parameter.check_definition()?;

        debug!(
            event = "Declare",
            phase = "Parameter",
            name = parameter.name(),
            kind = %parameter.kind(),
            no_echo = parameter.is_no_echo(),
            optional = parameter.absent_value().is_some()
        );

        let handle = ParameterRef::new(parameter.name());
        self.parameters.push(parameter);
        Ok(handle)
    }

    pub fn declare_guard(
        &mut self,
        name: impl Into<String>,
        condition: Condition,
    ) -> Result<GuardRef, TemplateError> {
        let name = name.into();
        self.check_name(Namespace::Guard, &name)?;
        self.check_condition(&format!("guard '{name}'"), &condition)?;

        debug!(event = "Declare", phase = "Guard", name = name.as_str());

        let handle = GuardRef::new(name);
        self.guards.push(Guard::new(handle.clone(), condition));
        Ok(handle)
    }

    /// Register a guard that holds when the optional `parameter` has a value,
    /// i.e. `Not(Equals(parameter, sentinel))` with the parameter's own sentinel.
    pub fn declare_presence_guard(
        &mut self,
        name: impl Into<String>,
        parameter: &ParameterRef,
    ) -> Result<GuardRef, TemplateError> {
        let name = name.into();
        let from = format!("guard '{name}'");
        let declared = self.lookup_parameter(&from, parameter.name())?;
        let sentinel = declared.absent_value().ok_or_else(|| {
            TemplateError::constraint(
                from.clone(),
                format!("parameter '{}' is not optional", parameter.name()),
            )
        })?;
        let condition = Condition::not_equals(parameter, sentinel);
        self.declare_guard(name, condition)
    }

    pub fn declare_resource(&mut self, resource: Resource) -> Result<ResourceRef, TemplateError> {
        self.check_name(Namespace::Resource, resource.name())?;
        let from = format!("resource '{}'", resource.name());

        if let Some(guard) = resource.guard() {
            self.lookup_guard(&from, guard.name())?;
        }
        for dep in resource.dependencies() {
            self.lookup_resource(&from, dep.name())?;
        }
        for (field, value) in resource.properties() {
            self.check_value(&format!("{from} field '{field}'"), value)?;
        }

        let extra: Vec<Value> = resource
            .dependencies()
            .iter()
            .map(Value::from)
            .collect();
        let fields = resource
            .properties()
            .iter()
            .map(|(_, v)| v)
            .chain(extra.iter());
        self.check_guard_consistency(&from, resource.guard(), fields)?;

        debug!(
            event = "Declare",
            phase = "Resource",
            name = resource.name(),
            kind = resource.kind(),
            guard = resource.guard().map(|g| g.name()),
            retention = ?resource.retention()
        );

        let handle = ResourceRef::new(resource.name());
        self.resources.push(resource);
        Ok(handle)
    }

    pub fn declare_output(&mut self, output: Output) -> Result<OutputRef, TemplateError> {
        self.check_name(Namespace::Output, output.name())?;
        let from = format!("output '{}'", output.name());

        if let Some(guard) = output.guard() {
            self.lookup_guard(&from, guard.name())?;
        }
        if output.value().is_omit() {
            return Err(TemplateError::constraint(from, "an output value cannot be OMIT"));
        }
        self.check_value(&format!("{from} value"), output.value())?;
        if let Some(export) = output.export_name() {
            if export.is_omit() {
                return Err(TemplateError::constraint(from, "an export name cannot be OMIT"));
            }
            self.check_value(&format!("{from} export"), export)?;
        }
        self.check_guard_consistency(
            &from,
            output.guard(),
            std::iter::once(output.value()).chain(output.export_name()),
        )?;

        debug!(event = "Declare", phase = "Output", name = output.name());

        let handle = OutputRef::new(output.name());
        self.outputs.push(output);
        Ok(handle)
    }

    /// Produce the immutable document. Calling this repeatedly yields the same
    /// result; guards are attached unevaluated.
    pub fn render(&self) -> Result<Document, TemplateError> {
        let started = Instant::now();

        for guard in &self.guards {
            self.check_links(&format!("guard '{}'", guard.name()), guard.condition())?;
        }
        for resource in &self.resources {
            self.check_links(&format!("resource '{}'", resource.name()), resource)?;
        }
        for output in &self.outputs {
            self.check_links(&format!("output '{}'", output.name()), output)?;
        }

        let document = Document {
            settings: self.settings.clone(),
            parameters: self.parameters.clone(),
            guards: self.guards.clone(),
            resources: self.resources.clone(),
            outputs: self.outputs.clone(),
        };

        info!(
            event = "Render",
            phase = "Result",
            parameters = document.parameters.len(),
            guards = document.guards.len(),
            resources = document.resources.len(),
            outputs = document.outputs.len(),
            elapsed_us = started.elapsed().as_micros() as u64
        );

        Ok(document)
    }

    pub fn parameter(&self, handle: &ParameterRef) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == handle.name())
    }

    pub fn guard(&self, handle: &GuardRef) -> Option<&Condition> {
        self.guard_condition(handle.name())
    }

    pub fn resource(&self, handle: &ResourceRef) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name() == handle.name())
    }

    pub fn output(&self, handle: &OutputRef) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name() == handle.name())
    }

    fn contains(&self, namespace: Namespace, name: &str) -> bool {
        match namespace {
            Namespace::Parameter => self.parameters.iter().any(|p| p.name() == name),
            Namespace::Guard => self.guards.iter().any(|g| g.name().name() == name),
            Namespace::Resource => self.resources.iter().any(|r| r.name() == name),
            Namespace::Output => self.outputs.iter().any(|o| o.name() == name),
        }
    }

    fn check_name(&self, namespace: Namespace, name: &str) -> Result<(), TemplateError> {
        validate_logical_id(namespace, name)?;

        let clash = [
            Namespace::Parameter,
            Namespace::Guard,
            Namespace::Resource,
            Namespace::Output,
        ]
        .into_iter()
        .filter(|ns| *ns == namespace || namespace.shares_symbols_with(*ns))
        .find(|ns| self.contains(*ns, name));

        match clash {
            Some(existing) => Err(TemplateError::DuplicateName {
                namespace: existing,
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn guard_condition(&self, name: &str) -> Option<&Condition> {
        self.guards
            .iter()
            .find(|g| g.name().name() == name)
            .map(Guard::condition)
    }

    fn lookup_parameter(&self, from: &str, name: &str) -> Result<&Parameter, TemplateError> {
        self.parameters
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| TemplateError::UnknownReference {
                from: from.to_string(),
                namespace: Namespace::Parameter,
                target: name.to_string(),
            })
    }

    fn lookup_resource(&self, from: &str, name: &str) -> Result<&Resource, TemplateError> {
        self.resources
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| TemplateError::UnknownReference {
                from: from.to_string(),
                namespace: Namespace::Resource,
                target: name.to_string(),
            })
    }

    fn lookup_guard(&self, from: &str, name: &str) -> Result<&Condition, TemplateError> {
        self.guard_condition(name)
            .ok_or_else(|| TemplateError::UnknownGuard {
                from: from.to_string(),
                guard: name.to_string(),
            })
    }

    fn check_links<R: Referencing + ?Sized>(&self, from: &str, item: &R) -> Result<(), TemplateError> {
        for link in item.links() {
            match link {
                Link::Parameter(name) => {
                    self.lookup_parameter(from, name)?;
                }
                Link::Resource(name) => {
                    self.lookup_resource(from, name)?;
                }
                Link::Guard(name) => {
                    self.lookup_guard(from, name)?;
                }
            }
        }
        Ok(())
    }

    fn check_value(&self, from: &str, value: &Value) -> Result<(), TemplateError> {
        self.check_links(from, value)
    }

    fn check_condition(&self, from: &str, condition: &Condition) -> Result<(), TemplateError> {
        match condition {
            Condition::Equals(left, right) => {
                for operand in [left, right] {
                    if let Operand::Parameter(p) = operand {
                        self.lookup_parameter(from, p.name())?;
                    }
                }
                match (left, right) {
                    (Operand::Parameter(p), Operand::Literal(literal))
                    | (Operand::Literal(literal), Operand::Parameter(p)) => {
                        self.check_literal(from, p, literal)
                    }
                    _ => Ok(()),
                }
            }
            Condition::Not(inner) => self.check_condition(from, inner),
            Condition::And(items) | Condition::Or(items) => {
                if !(MIN_COMPOSITE_OPERANDS..=MAX_COMPOSITE_OPERANDS).contains(&items.len()) {
                    return Err(TemplateError::constraint(
                        from,
                        format!(
                            "Fn::And and Fn::Or take between {MIN_COMPOSITE_OPERANDS} and {MAX_COMPOSITE_OPERANDS} conditions, got {}",
                            items.len()
                        ),
                    ));
                }
                items
                    .iter()
                    .try_for_each(|item| self.check_condition(from, item))
            }
            Condition::Guard(g) => self.lookup_guard(from, g.name()).map(|_| ()),
        }
    }

    /// A literal compared with a parameter must be a value the parameter can take.
    fn check_literal(&self, from: &str, parameter: &ParameterRef, literal: &str) -> Result<(), TemplateError> {
        let declared = self.lookup_parameter(from, parameter.name())?;
        declared.validate_value(literal).map_err(|err| match err {
            TemplateError::InvalidConstraint { constraint, .. } => TemplateError::constraint(
                from,
                format!(
                    "compares parameter '{}' with a value it can never take: {constraint}",
                    parameter.name()
                ),
            ),
            other => other,
        })
    }

    fn implies(&self, cover: &GuardRef, target: &GuardRef) -> bool {
        Condition::guard(cover).implies(target, &|name: &str| self.guard_condition(name))
    }

    /// Guarded resources referenced from `values` whose guard is not implied by
    /// `cover`, an enclosing selection, or a chain of either.
    fn uncovered<'a>(
        &'a self,
        value: &'a Value,
        cover: &mut Vec<&'a GuardRef>,
        out: &mut Vec<(&'a str, &'a GuardRef)>,
    ) {
        let target = match value {
            Value::Ref(Reference::Resource(r)) => Some(r),
            Value::GetAtt { resource, .. } => Some(resource),
            Value::List(items) | Value::Join { parts: items, .. } => {
                items.iter().for_each(|v| self.uncovered(v, cover, out));
                None
            }
            Value::Object(fields) => {
                fields.iter().for_each(|(_, v)| self.uncovered(v, cover, out));
                None
            }
            Value::Select {
                guard,
                on_true,
                on_false,
            } => {
                cover.push(guard);
                self.uncovered(on_true, cover, out);
                cover.pop();
                self.uncovered(on_false, cover, out);
                None
            }
            _ => None,
        };

        let Some(target) = target else { return };
        let Some(required) = self
            .resources
            .iter()
            .find(|r| r.name() == target.name())
            .and_then(Resource::guard)
        else {
            return;
        };
        if !cover.iter().any(|c| self.implies(c, required)) {
            out.push((target.name(), required));
        }
    }

    fn check_guard_consistency<'a, I>(
        &self,
        from: &str,
        own: Option<&GuardRef>,
        values: I,
    ) -> Result<(), TemplateError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        if self.settings.guard_consistency == GuardConsistency::Ignore {
            return Ok(());
        }

        let mut out = Vec::new();
        for value in values {
            let mut cover: Vec<&GuardRef> = own.into_iter().collect();
            self.uncovered(value, &mut cover, &mut out);
        }

        for (target, guard) in out {
            match self.settings.guard_consistency {
                GuardConsistency::Deny => {
                    return Err(TemplateError::InconsistentGuard {
                        from: from.to_string(),
                        target: target.to_string(),
                        guard: guard.name().to_string(),
                    });
                }
                _ => warn!(
                    event = "Declare",
                    phase = "GuardConsistency",
                    from = from,
                    target = target,
                    guard = guard.name(),
                    "reference to a guarded resource is not covered by the referencing guard"
                ),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
