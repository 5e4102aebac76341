//! Condition predicates for guarded operations.
//!
//! A condition sees the owning instance and the call arguments, exactly what
//! the business logic will see, and answers whether the transition may run.

use std::fmt;

/// Named predicate that must hold for a transition to proceed.
///
/// # Example
///
/// ```rust
/// use fsmguard::core::Condition;
///
/// struct Invoice {
///     amount: u64,
/// }
///
/// let positive = Condition::named("positive_amount", |inv: &Invoice, _: &()| inv.amount > 0);
///
/// assert!(positive.check(&Invoice { amount: 10 }, &()));
/// assert!(!positive.check(&Invoice { amount: 0 }, &()));
/// assert_eq!(positive.name(), Some("positive_amount"));
/// ```
pub struct Condition<T, A> {
    name: Option<String>,
    predicate: Box<dyn Fn(&T, &A) -> bool + Send + Sync>,
}

impl<T, A> Condition<T, A> {
    /// Create an anonymous condition. Failures report it by position only.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T, &A) -> bool + Send + Sync + 'static,
    {
        Condition {
            name: None,
            predicate: Box::new(predicate),
        }
    }

    /// Create a condition that failures report by name.
    pub fn named<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T, &A) -> bool + Send + Sync + 'static,
    {
        Condition {
            name: Some(name.into()),
            predicate: Box::new(predicate),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Evaluate the predicate.
    pub fn check(&self, instance: &T, args: &A) -> bool {
        (self.predicate)(instance, args)
    }
}

impl<T, A> fmt::Debug for Condition<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
