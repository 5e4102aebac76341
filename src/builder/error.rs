//! Registration errors for fields, rules and registries.

use std::fmt;
use thiserror::Error;

/// Which role a label plays in a rule, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRole {
    Source,
    Destination,
    OnError,
    Default,
}

impl fmt::Display for StateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            Self::Source => "source",
            Self::Destination => "destination",
            Self::OnError => "on_error",
            Self::Default => "default",
        };
        f.write_str(role)
    }
}

/// One problem found while validating a field or a rule.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleViolation {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },

    #[error("field '{field}' declares no states")]
    NoStates { field: String },

    #[error("field '{field}' lists state '{state}' more than once")]
    DuplicateState { field: String, state: String },

    #[error("{role} state '{state}' is not an allowed value of field '{field}'")]
    StateNotAllowed {
        role: StateRole,
        field: String,
        state: String,
    },

    #[error("unknown {role} state name '{name}' for field '{field}'")]
    UnknownStateName {
        role: StateRole,
        field: String,
        name: String,
    },

    #[error("no source declared. Call .from(state), .from_any() or .from_any_but_same()")]
    MissingSource,

    #[error("explicit source set is empty")]
    EmptySource,

    #[error("one_of destination set is empty")]
    EmptyDestination,

    #[error("no business logic attached. Call .logic(f) or .succeeds()")]
    MissingLogic,

    #[error("rule uses field '{field}' but the operation is already bound to field '{bound}'")]
    FieldMismatch { field: String, bound: String },

    #[error("source overlaps an existing rule of the same operation (ambiguous dispatch)")]
    OverlappingSource,

    #[error("registry declares no transitions")]
    NoTransitions,
}

/// Registration failure. Carries every violation found for its subject.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid {subject}: {}", join(.violations))]
pub struct ConfigurationError {
    /// What was being registered, e.g. `operation 'pay'`
    pub subject: String,
    pub violations: Vec<RuleViolation>,
}

impl ConfigurationError {
    pub fn new(subject: impl Into<String>, violations: Vec<RuleViolation>) -> Self {
        Self {
            subject: subject.into(),
            violations,
        }
    }

    pub fn single(subject: impl Into<String>, violation: RuleViolation) -> Self {
        Self::new(subject, vec![violation])
    }

    /// Whether any violation matches `predicate`.
    pub fn has(&self, predicate: impl Fn(&RuleViolation) -> bool) -> bool {
        self.violations.iter().any(predicate)
    }
}

pub(crate) fn operation_subject(operation: &str) -> String {
    format!("operation '{operation}'")
}

pub(crate) fn field_subject(field: &str) -> String {
    format!("field '{field}'")
}

fn join(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_violation() {
        let err = ConfigurationError::new(
            operation_subject("pay"),
            vec![
                RuleViolation::MissingSource,
                RuleViolation::StateNotAllowed {
                    role: StateRole::Destination,
                    field: "state".to_string(),
                    state: "lost".to_string(),
                },
            ],
        );

        assert_eq!(
            err.to_string(),
            "invalid operation 'pay': no source declared. Call .from(state), .from_any() or \
             .from_any_but_same(); destination state 'lost' is not an allowed value of field 'state'"
        );
    }

    #[test]
    fn has_matches_violation_kind() {
        let err = ConfigurationError::single(field_subject("state"), RuleViolation::NoStates {
            field: "state".to_string(),
        });

        assert!(err.has(|v| matches!(v, RuleViolation::NoStates { .. })));
        assert!(!err.has(|v| matches!(v, RuleViolation::MissingLogic)));
    }
}
