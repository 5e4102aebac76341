//! Per-type transition registry and its builder.

use crate::builder::config::{
    DestinationConfig, TransitionConfig, ANY_BUT_SAME_SOURCE, ANY_SOURCE,
};
use crate::builder::error::{
    field_subject, operation_subject, ConfigurationError, RuleViolation, StateRole,
};
use crate::builder::rule::{DestinationSpec, SourceSpec, TransitionBuilder, TransitionRule};
use crate::core::{FieldSchema, State, StateField, Stateful};
use crate::snapshot::{FieldSnapshot, SnapshotError};
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check<T> = Validation<T, NonEmptyVec<RuleViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> RuleViolation) -> Check<()> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

/// Collapse accumulated checks into a registration result.
fn finish(subject: String, checks: Vec<Check<()>>) -> Result<(), ConfigurationError> {
    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(violations) => Err(ConfigurationError::new(
            subject,
            violations.iter().cloned().collect(),
        )),
    }
}

/// Check every label of `states` against the field.
fn members<'a, S: State>(
    schema: &'a FieldSchema<S>,
    role: StateRole,
    states: &'a [S],
) -> impl Iterator<Item = Check<()>> + 'a {
    states.iter().map(move |state| {
        check(schema.allows(state), || RuleViolation::StateNotAllowed {
            role,
            field: schema.name().to_string(),
            state: state.name().to_string(),
        })
    })
}

/// Builder for a [`TransitionRegistry`].
///
/// Fields are declared first; each transition is validated against them as
/// it is added, so a bad rule fails at the call that adds it.
pub struct RegistryBuilder<T: Stateful> {
    fields: Vec<FieldSchema<T::State>>,
    rules: HashMap<String, Vec<TransitionRule<T>>>,
    operations: Vec<String>,
}

impl<T: Stateful + 'static> RegistryBuilder<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            rules: HashMap::new(),
            operations: Vec::new(),
        }
    }

    /// Declare a state field.
    pub fn field(mut self, schema: FieldSchema<T::State>) -> Result<Self, ConfigurationError> {
        let name = schema.name().to_string();
        let allowed = schema.allowed();

        let mut checks = vec![
            check(self.schema(&name).is_none(), || {
                RuleViolation::DuplicateField {
                    field: name.clone(),
                }
            }),
            check(!allowed.is_empty(), || RuleViolation::NoStates {
                field: name.clone(),
            }),
            check(schema.allows(schema.default_value()), || {
                RuleViolation::StateNotAllowed {
                    role: StateRole::Default,
                    field: name.clone(),
                    state: schema.default_value().name().to_string(),
                }
            }),
        ];
        for (i, state) in allowed.iter().enumerate() {
            checks.push(check(!allowed[..i].contains(state), || {
                RuleViolation::DuplicateState {
                    field: name.clone(),
                    state: state.name().to_string(),
                }
            }));
        }
        finish(field_subject(&name), checks)?;

        self.fields.push(schema);
        Ok(self)
    }

    /// Validate and add a transition rule.
    pub fn transition(mut self, builder: TransitionBuilder<T>) -> Result<Self, ConfigurationError> {
        let rule = builder.build()?;
        self.validate(&rule)?;

        let operation = rule.operation.clone();
        match self.rules.get_mut(&operation) {
            Some(rules) => rules.push(rule),
            None => {
                self.operations.push(operation.clone());
                self.rules.insert(operation, vec![rule]);
            }
        }
        Ok(self)
    }

    /// Resolve a label-level config against its field and return a builder
    /// with source, destination, on_error and custom filled in.
    pub fn configured(
        &self,
        operation: impl Into<String>,
        config: &TransitionConfig,
    ) -> Result<TransitionBuilder<T>, ConfigurationError> {
        let operation = operation.into();
        let subject = operation_subject(&operation);
        let schema = self.schema(&config.field).ok_or_else(|| {
            ConfigurationError::single(
                subject.clone(),
                RuleViolation::UnknownField {
                    field: config.field.clone(),
                },
            )
        })?;

        let resolve = |role: StateRole, names: &[String]| -> Check<Vec<T::State>> {
            let resolved: Vec<Check<T::State>> = names
                .iter()
                .map(|name| match schema.lookup(name) {
                    Some(state) => Validation::success(state.clone()),
                    None => Validation::fail(RuleViolation::UnknownStateName {
                        role,
                        field: schema.name().to_string(),
                        name: name.clone(),
                    }),
                })
                .collect();
            Validation::all_vec(resolved)
        };

        let source = match config.src.names() {
            [token] if token == ANY_SOURCE => Validation::success(SourceSpec::Any),
            [token] if token == ANY_BUT_SAME_SOURCE => {
                Validation::success(SourceSpec::AnyButSame)
            }
            names => resolve(StateRole::Source, names).map(SourceSpec::Explicit),
        };
        let destination = match &config.dest {
            None => Validation::success(DestinationSpec::Dynamic),
            Some(DestinationConfig::Fixed(name)) => {
                resolve(StateRole::Destination, std::slice::from_ref(name))
                    .map(|mut states| DestinationSpec::Fixed(states.remove(0)))
            }
            Some(DestinationConfig::OneOf { one_of }) => {
                resolve(StateRole::Destination, one_of).map(DestinationSpec::OneOf)
            }
        };
        let on_error = match &config.on_error {
            None => Validation::success(None),
            Some(name) => resolve(StateRole::OnError, std::slice::from_ref(name))
                .map(|mut states| states.pop()),
        };

        match (source, destination, on_error) {
            (
                Validation::Success(source),
                Validation::Success(destination),
                Validation::Success(on_error),
            ) => {
                let builder = TransitionBuilder::new(operation)
                    .field(config.field.clone())
                    .source(source)
                    .destination(destination)
                    .custom_map(config.custom.clone());
                Ok(match on_error {
                    Some(state) => builder.on_error(state),
                    None => builder,
                })
            }
            (source, destination, on_error) => {
                let mut violations = Vec::new();
                if let Validation::Failure(errors) = source {
                    violations.extend(errors.iter().cloned());
                }
                if let Validation::Failure(errors) = destination {
                    violations.extend(errors.iter().cloned());
                }
                if let Validation::Failure(errors) = on_error {
                    violations.extend(errors.iter().cloned());
                }
                Err(ConfigurationError::new(subject, violations))
            }
        }
    }

    /// Finish the registry.
    pub fn build(self) -> Result<TransitionRegistry<T>, ConfigurationError> {
        if self.rules.is_empty() {
            return Err(ConfigurationError::single(
                "registry",
                RuleViolation::NoTransitions,
            ));
        }
        tracing::debug!(
            fields = self.fields.len(),
            operations = self.operations.len(),
            "transition registry built"
        );
        Ok(TransitionRegistry {
            fields: self.fields,
            rules: self.rules,
            operations: self.operations,
        })
    }

    fn schema(&self, name: &str) -> Option<&FieldSchema<T::State>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    fn validate(&self, rule: &TransitionRule<T>) -> Result<(), ConfigurationError> {
        let subject = operation_subject(&rule.operation);
        let schema = self.schema(&rule.field).ok_or_else(|| {
            ConfigurationError::single(
                subject.clone(),
                RuleViolation::UnknownField {
                    field: rule.field.clone(),
                },
            )
        })?;

        let mut checks = Vec::new();
        if let SourceSpec::Explicit(states) = &rule.source {
            checks.extend(members(schema, StateRole::Source, states));
        }
        match &rule.destination {
            DestinationSpec::Fixed(state) => {
                checks.extend(members(schema, StateRole::Destination, std::slice::from_ref(state)))
            }
            DestinationSpec::OneOf(states) => {
                checks.extend(members(schema, StateRole::Destination, states))
            }
            DestinationSpec::Dynamic => {}
        }
        if let Some(state) = &rule.on_error {
            checks.extend(members(schema, StateRole::OnError, std::slice::from_ref(state)));
        }

        let existing = self
            .rules
            .get(&rule.operation)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(bound) = existing.first() {
            checks.push(check(bound.field == rule.field, || {
                RuleViolation::FieldMismatch {
                    field: rule.field.clone(),
                    bound: bound.field.clone(),
                }
            }));
        }
        checks.push(check(
            existing.iter().all(|other| !other.source.overlaps(&rule.source)),
            || RuleViolation::OverlappingSource,
        ));

        finish(subject, checks)
    }
}

impl<T: Stateful + 'static> Default for RegistryBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable table of an owning type's fields and guarded operations.
///
/// Build it once per type and share it (`Arc`, `OnceLock`); it is never
/// mutated after [`RegistryBuilder::build`].
pub struct TransitionRegistry<T: Stateful> {
    fields: Vec<FieldSchema<T::State>>,
    rules: HashMap<String, Vec<TransitionRule<T>>>,
    operations: Vec<String>,
}

impl<T: Stateful> TransitionRegistry<T> {
    pub fn schema(&self, field: &str) -> Option<&FieldSchema<T::State>> {
        self.fields.iter().find(|f| f.name() == field)
    }

    pub fn schemas(&self) -> &[FieldSchema<T::State>] {
        &self.fields
    }

    /// A fresh field holding its declared default.
    pub fn new_field(&self, field: &str) -> Option<StateField<T::State>> {
        self.schema(field).map(FieldSchema::instantiate)
    }

    /// A field holding a stored value, for loading persisted instances.
    pub fn load_field(
        &self,
        snapshot: &FieldSnapshot<T::State>,
    ) -> Result<StateField<T::State>, SnapshotError> {
        let schema = self
            .schema(&snapshot.field)
            .ok_or_else(|| SnapshotError::UnknownField {
                field: snapshot.field.clone(),
            })?;
        StateField::from_snapshot(schema, snapshot)
    }

    /// Operation names, in registration order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(String::as_str)
    }

    /// Rules registered for `operation`, in registration order.
    pub fn rules(&self, operation: &str) -> Option<&[TransitionRule<T>]> {
        self.rules.get(operation).map(Vec::as_slice)
    }

    /// The rule of `operation` whose source matches `current`.
    pub fn find(&self, operation: &str, current: &T::State) -> Option<&TransitionRule<T>> {
        self.rules(operation)?
            .iter()
            .find(|rule| rule.source.matches(current))
    }
}

impl<T: Stateful> std::fmt::Debug for TransitionRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionRegistry")
            .field("fields", &self.fields)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}
