//! Transition rules and the builder that assembles them.

use crate::builder::error::{operation_subject, ConfigurationError, RuleViolation};
use crate::core::{Condition, State, Stateful};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Free-form metadata attached to a rule and handed to observers untouched.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Business logic wrapped by a guarded operation.
///
/// The returned label, if any, is what `OneOf` and `Dynamic` destinations
/// resolve from. It is also the value handed back to the caller.
pub type Logic<T> = Box<
    dyn Fn(
            &mut T,
            &<T as Stateful>::Args,
        ) -> Result<Option<<T as Stateful>::State>, <T as Stateful>::Error>
        + Send
        + Sync,
>;

/// Which current states permit a rule to run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum SourceSpec<S: State> {
    /// Every state (`'*'`).
    Any,
    /// Every state, but the destination must differ from it (`'+'`).
    AnyButSame,
    /// Only the listed states.
    Explicit(Vec<S>),
}

impl<S: State> SourceSpec<S> {
    pub fn matches(&self, current: &S) -> bool {
        match self {
            Self::Any | Self::AnyButSame => true,
            Self::Explicit(states) => states.contains(current),
        }
    }

    /// Whether some state would be matched by both specs.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Explicit(a), Self::Explicit(b)) => a.iter().any(|s| b.contains(s)),
            _ => true,
        }
    }
}

/// How the next state is computed once the logic returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum DestinationSpec<S: State> {
    /// Always this state; the returned value is ignored.
    Fixed(S),
    /// The returned value, which must be one of these.
    OneOf(Vec<S>),
    /// The returned value, which must be allowed by the field.
    Dynamic,
}

/// Immutable descriptor of one guarded operation path.
pub struct TransitionRule<T: Stateful> {
    pub(crate) operation: String,
    pub(crate) field: String,
    pub(crate) source: SourceSpec<T::State>,
    pub(crate) destination: DestinationSpec<T::State>,
    pub(crate) conditions: Vec<Condition<T, T::Args>>,
    pub(crate) on_error: Option<T::State>,
    pub(crate) custom: Metadata,
    pub(crate) logic: Logic<T>,
}

impl<T: Stateful> TransitionRule<T> {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn source(&self) -> &SourceSpec<T::State> {
        &self.source
    }

    pub fn destination(&self) -> &DestinationSpec<T::State> {
        &self.destination
    }

    pub fn conditions(&self) -> &[Condition<T, T::Args>] {
        &self.conditions
    }

    pub fn on_error(&self) -> Option<&T::State> {
        self.on_error.as_ref()
    }

    pub fn custom(&self) -> &Metadata {
        &self.custom
    }

    /// Evaluate conditions in order and return the index of the first one
    /// that does not hold. Later conditions are not evaluated.
    pub(crate) fn first_failed_condition(&self, instance: &T, args: &T::Args) -> Option<usize> {
        self.conditions
            .iter()
            .position(|condition| !condition.check(instance, args))
    }
}

impl<T: Stateful> fmt::Debug for TransitionRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("operation", &self.operation)
            .field("field", &self.field)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("conditions", &self.conditions)
            .field("on_error", &self.on_error)
            .field("custom", &self.custom)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for a [`TransitionRule`].
///
/// The field defaults to `"state"` and the destination to
/// [`DestinationSpec::Dynamic`]. A source and the logic are required.
/// Labels are checked against the field when the rule is added to a
/// [`RegistryBuilder`](crate::builder::RegistryBuilder).
pub struct TransitionBuilder<T: Stateful> {
    operation: String,
    field: String,
    source: Option<SourceSpec<T::State>>,
    destination: DestinationSpec<T::State>,
    conditions: Vec<Condition<T, T::Args>>,
    on_error: Option<T::State>,
    custom: Metadata,
    logic: Option<Logic<T>>,
}

impl<T: Stateful + 'static> TransitionBuilder<T> {
    /// Start a rule for the operation named `operation`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            field: "state".to_string(),
            source: None,
            destination: DestinationSpec::Dynamic,
            conditions: Vec::new(),
            on_error: None,
            custom: Metadata::new(),
            logic: None,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Name the state field this rule drives.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.field = name.into();
        self
    }

    /// Run from a single state.
    pub fn from(self, state: T::State) -> Self {
        self.source(SourceSpec::Explicit(vec![state]))
    }

    /// Run from any of the listed states.
    pub fn from_states(self, states: impl IntoIterator<Item = T::State>) -> Self {
        self.source(SourceSpec::Explicit(states.into_iter().collect()))
    }

    pub fn from_any(self) -> Self {
        self.source(SourceSpec::Any)
    }

    pub fn from_any_but_same(self) -> Self {
        self.source(SourceSpec::AnyButSame)
    }

    pub fn source(mut self, source: SourceSpec<T::State>) -> Self {
        self.source = Some(source);
        self
    }

    /// Always land in `state`.
    pub fn to(self, state: T::State) -> Self {
        self.destination(DestinationSpec::Fixed(state))
    }

    /// Land in whichever of `states` the logic returns.
    pub fn to_one_of(self, states: impl IntoIterator<Item = T::State>) -> Self {
        self.destination(DestinationSpec::OneOf(states.into_iter().collect()))
    }

    /// Land in whatever allowed state the logic returns.
    pub fn to_dynamic(self) -> Self {
        self.destination(DestinationSpec::Dynamic)
    }

    pub fn destination(mut self, destination: DestinationSpec<T::State>) -> Self {
        self.destination = destination;
        self
    }

    /// State to adopt when the logic fails.
    pub fn on_error(mut self, state: T::State) -> Self {
        self.on_error = Some(state);
        self
    }

    pub fn condition(mut self, condition: Condition<T, T::Args>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an anonymous condition using a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&T, &T::Args) -> bool + Send + Sync + 'static,
    {
        self.condition(Condition::new(predicate))
    }

    pub fn custom(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn custom_map(mut self, custom: Metadata) -> Self {
        self.custom.extend(custom);
        self
    }

    /// Attach the business logic.
    pub fn logic<F>(mut self, logic: F) -> Self
    where
        F: Fn(&mut T, &T::Args) -> Result<Option<T::State>, T::Error> + Send + Sync + 'static,
    {
        self.logic = Some(Box::new(logic));
        self
    }

    /// Attach logic that does nothing and returns no label.
    ///
    /// Only useful with a fixed destination.
    pub fn succeeds(self) -> Self {
        self.logic(|_, _| Ok(None))
    }

    /// Build the rule, checking what can be checked without the field.
    pub fn build(self) -> Result<TransitionRule<T>, ConfigurationError> {
        let mut violations = Vec::new();
        match &self.source {
            None => violations.push(RuleViolation::MissingSource),
            Some(SourceSpec::Explicit(states)) if states.is_empty() => {
                violations.push(RuleViolation::EmptySource)
            }
            Some(_) => {}
        }
        if matches!(&self.destination, DestinationSpec::OneOf(states) if states.is_empty()) {
            violations.push(RuleViolation::EmptyDestination);
        }
        if self.logic.is_none() {
            violations.push(RuleViolation::MissingLogic);
        }

        let (Some(source), Some(logic)) = (self.source, self.logic) else {
            return Err(ConfigurationError::new(
                operation_subject(&self.operation),
                violations,
            ));
        };
        if !violations.is_empty() {
            return Err(ConfigurationError::new(
                operation_subject(&self.operation),
                violations,
            ));
        }

        Ok(TransitionRule {
            operation: self.operation,
            field: self.field,
            source,
            destination: self.destination,
            conditions: self.conditions,
            on_error: self.on_error,
            custom: self.custom,
            logic,
        })
    }
}
