//! Runtime errors returned by guarded calls.

use std::fmt;
use thiserror::Error;

/// Why a destination was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationFault {
    /// The logic returned no label, but the rule needs one.
    Missing,
    /// The returned label is not in the rule's `OneOf` set.
    NotInSet,
    /// The label is not an allowed value of the field.
    NotAllowed,
    /// The destination equals the source under an any-but-same source.
    SameAsSource,
}

impl fmt::Display for DestinationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Missing => "no destination returned",
            Self::NotInSet => "not one of the declared destinations",
            Self::NotAllowed => "not an allowed value of the field",
            Self::SameAsSource => "destination must differ from the source",
        };
        f.write_str(reason)
    }
}

/// Errors that can occur during a guarded call.
///
/// Every variant except [`Logic`](Self::Logic) leaves the field untouched.
/// `Logic` may follow an error-fallback commit.
#[derive(Debug, Error)]
pub enum TransitionError<E> {
    #[error("operation '{operation}' is not registered")]
    UnknownOperation { operation: String },

    #[error("can't switch from state '{state}' of field '{field}' using '{operation}'")]
    NotAllowed {
        operation: String,
        field: String,
        state: String,
    },

    #[error("condition {} of '{operation}' was not met", describe(.index, .condition))]
    ConditionFailed {
        operation: String,
        index: usize,
        condition: Option<String>,
    },

    #[error(
        "invalid destination {} for '{operation}' from '{from_state}': {fault}",
        .destination.as_deref().unwrap_or("<none>")
    )]
    InvalidDestination {
        operation: String,
        from_state: String,
        destination: Option<String>,
        fault: DestinationFault,
    },

    #[error("field '{field}' used by '{operation}' is not exposed by the instance")]
    FieldUnavailable { operation: String, field: String },

    #[error("'{operation}' failed: {error}")]
    Logic { operation: String, error: E },
}

impl<E> TransitionError<E> {
    /// The business logic's error, if that is what this is.
    pub fn logic_error(&self) -> Option<&E> {
        match self {
            Self::Logic { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn into_logic_error(self) -> Option<E> {
        match self {
            Self::Logic { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether the call was refused before the logic ran.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperation { .. } | Self::NotAllowed { .. } | Self::ConditionFailed { .. }
        )
    }
}

fn describe(index: &usize, name: &Option<String>) -> String {
    match name {
        Some(name) => format!("#{index} ('{name}')"),
        None => format!("#{index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_allowed_names_state_and_operation() {
        let err: TransitionError<String> = TransitionError::NotAllowed {
            operation: "pay".to_string(),
            field: "state".to_string(),
            state: "paid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "can't switch from state 'paid' of field 'state' using 'pay'"
        );
        assert!(err.is_rejection());
    }

    #[test]
    fn condition_failure_uses_name_when_present() {
        let named: TransitionError<String> = TransitionError::ConditionFailed {
            operation: "refund".to_string(),
            index: 1,
            condition: Some("can_refund".to_string()),
        };
        let anonymous: TransitionError<String> = TransitionError::ConditionFailed {
            operation: "refund".to_string(),
            index: 0,
            condition: None,
        };

        assert_eq!(
            named.to_string(),
            "condition #1 ('can_refund') of 'refund' was not met"
        );
        assert_eq!(anonymous.to_string(), "condition #0 of 'refund' was not met");
    }

    #[test]
    fn invalid_destination_display() {
        let err: TransitionError<String> = TransitionError::InvalidDestination {
            operation: "review".to_string(),
            from_state: "pending".to_string(),
            destination: Some("pending".to_string()),
            fault: DestinationFault::SameAsSource,
        };
        assert_eq!(
            err.to_string(),
            "invalid destination pending for 'review' from 'pending': destination must differ from the source"
        );

        let missing: TransitionError<String> = TransitionError::InvalidDestination {
            operation: "review".to_string(),
            from_state: "pending".to_string(),
            destination: None,
            fault: DestinationFault::Missing,
        };
        assert!(missing.to_string().contains("<none>"));
        assert!(!missing.is_rejection());
    }

    #[test]
    fn logic_error_is_recoverable() {
        let err = TransitionError::Logic {
            operation: "charge".to_string(),
            error: "card declined".to_string(),
        };
        assert_eq!(err.to_string(), "'charge' failed: card declined");
        assert_eq!(err.logic_error().map(String::as_str), Some("card declined"));
        assert_eq!(err.into_logic_error().as_deref(), Some("card declined"));
    }
}
