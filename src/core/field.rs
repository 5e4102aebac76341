//! State fields and their schemas.
//!
//! A [`FieldSchema`] is declared once per owning type; every instance holds a
//! [`StateField`] created from it. The field guarantees its value is always
//! one of the schema's allowed labels.

use super::state::State;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised at the field boundary by direct (non-engine) writes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FieldError {
    #[error("'{value}' is not an allowed value for field '{field}'")]
    InvalidState { field: String, value: String },

    #[error("field '{field}' is readonly; direct modification is not allowed")]
    ReadOnly { field: String },
}

/// Declaration of a state field: its name, legal labels, default and
/// write policy.
///
/// Fields are readonly unless [`writable`](Self::writable) is called.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FieldSchema<S: State> {
    name: String,
    allowed: Vec<S>,
    default: S,
    readonly: bool,
}

impl<S: State> FieldSchema<S> {
    /// Declare a readonly field.
    ///
    /// The schema is checked when it is added to a
    /// [`RegistryBuilder`](crate::builder::RegistryBuilder).
    pub fn new(name: impl Into<String>, allowed: impl IntoIterator<Item = S>, default: S) -> Self {
        Self {
            name: name.into(),
            allowed: allowed.into_iter().collect(),
            default,
            readonly: true,
        }
    }

    /// Allow direct external writes of allowed labels.
    pub fn writable(mut self) -> Self {
        self.readonly = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed(&self) -> &[S] {
        &self.allowed
    }

    pub fn default_value(&self) -> &S {
        &self.default
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Whether `value` is one of the field's labels.
    pub fn allows(&self, value: &S) -> bool {
        self.allowed.contains(value)
    }

    /// Find an allowed label by its [`State::name`].
    pub fn lookup(&self, name: &str) -> Option<&S> {
        self.allowed.iter().find(|s| s.name() == name)
    }

    /// Create an instance field from an already validated schema.
    pub(crate) fn instantiate(&self) -> StateField<S> {
        StateField {
            name: self.name.clone(),
            value: self.default.clone(),
            allowed: self.allowed.clone(),
            readonly: self.readonly,
        }
    }
}

/// Per-instance holder of a state value.
///
/// # Example
///
/// ```rust
/// use fsmguard::core::{FieldError, FieldSchema, StateField};
///
/// let schema = FieldSchema::new(
///     "state",
///     ["unpaid".to_string(), "paid".to_string()],
///     "unpaid".to_string(),
/// );
/// let mut field = StateField::from_schema(&schema).unwrap();
///
/// assert_eq!(field.value(), "unpaid");
/// assert!(matches!(
///     field.write("paid".to_string()),
///     Err(FieldError::ReadOnly { .. })
/// ));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StateField<S: State> {
    name: String,
    value: S,
    allowed: Vec<S>,
    readonly: bool,
}

impl<S: State> StateField<S> {
    /// Create a field holding the schema's default.
    ///
    /// Fails if the default is not one of the allowed labels.
    pub fn from_schema(schema: &FieldSchema<S>) -> Result<Self, FieldError> {
        if !schema.allows(&schema.default) {
            return Err(FieldError::InvalidState {
                field: schema.name.clone(),
                value: schema.default.name().to_string(),
            });
        }
        Ok(schema.instantiate())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value. Always a member of [`allowed`](Self::allowed).
    pub fn value(&self) -> &S {
        &self.value
    }

    pub fn allowed(&self) -> &[S] {
        &self.allowed
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn allows(&self, value: &S) -> bool {
        self.allowed.contains(value)
    }

    /// Direct external write.
    ///
    /// Rejected on readonly fields and for labels outside the allowed set.
    pub fn write(&mut self, value: S) -> Result<(), FieldError> {
        if self.readonly {
            return Err(FieldError::ReadOnly {
                field: self.name.clone(),
            });
        }
        self.commit(value)
    }

    /// Engine-side write: skips the readonly check, never the membership check.
    pub(crate) fn commit(&mut self, value: S) -> Result<(), FieldError> {
        if !self.allows(&value) {
            return Err(FieldError::InvalidState {
                field: self.name.clone(),
                value: value.name().to_string(),
            });
        }
        self.value = value;
        Ok(())
    }
}
