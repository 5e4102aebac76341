//! The transition executor.
//!
//! Runs a guarded call end to end: rule lookup, conditions, business logic,
//! destination resolution, commit, notification. Everything happens on the
//! caller's thread; exclusive access to the instance comes from `&mut T`.

use crate::builder::{DestinationSpec, SourceSpec, TransitionRegistry, TransitionRule};
use crate::core::{State, Stateful};
use crate::engine::error::{DestinationFault, TransitionError};
use crate::engine::notify::{EventKind, Notifier, TransitionEvent};
use std::sync::Arc;

type CallResult<T> =
    Result<Option<<T as Stateful>::State>, TransitionError<<T as Stateful>::Error>>;

/// Executes guarded operations registered in a [`TransitionRegistry`].
///
/// # Example
///
/// ```rust
/// use fsmguard::builder::{RegistryBuilder, TransitionBuilder};
/// use fsmguard::core::{FieldSchema, StateField, Stateful};
/// use fsmguard::engine::{TransitionError, TransitionExecutor};
/// use fsmguard::state_enum;
/// use std::sync::Arc;
///
/// state_enum! {
///     enum Payment {
///         Unpaid,
///         Paid,
///     }
/// }
///
/// struct Invoice {
///     state: StateField<Payment>,
/// }
///
/// impl Stateful for Invoice {
///     type State = Payment;
///     type Args = ();
///     type Error = String;
///
///     fn state_field(&self, name: &str) -> Option<&StateField<Payment>> {
///         (name == "state").then_some(&self.state)
///     }
///
///     fn state_field_mut(&mut self, name: &str) -> Option<&mut StateField<Payment>> {
///         (name == "state").then_some(&mut self.state)
///     }
/// }
///
/// let registry = RegistryBuilder::<Invoice>::new()
///     .field(FieldSchema::new("state", Payment::all(), Payment::Unpaid))
///     .unwrap()
///     .transition(
///         TransitionBuilder::<Invoice>::new("pay")
///             .from(Payment::Unpaid)
///             .to(Payment::Paid)
///             .succeeds(),
///     )
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let executor = TransitionExecutor::new(Arc::new(registry));
/// let mut invoice = Invoice {
///     state: executor.registry().new_field("state").unwrap(),
/// };
///
/// executor.execute(&mut invoice, "pay", &()).unwrap();
/// assert_eq!(invoice.state.value(), &Payment::Paid);
///
/// let second = executor.execute(&mut invoice, "pay", &());
/// assert!(matches!(second, Err(TransitionError::NotAllowed { .. })));
/// ```
pub struct TransitionExecutor<T: Stateful> {
    registry: Arc<TransitionRegistry<T>>,
    notifier: Option<Arc<dyn Notifier<T>>>,
}

impl<T: Stateful> Clone for TransitionExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            notifier: self.notifier.clone(),
        }
    }
}

impl<T: Stateful + 'static> TransitionExecutor<T> {
    /// Create an executor that emits no notifications.
    pub fn new(registry: Arc<TransitionRegistry<T>>) -> Self {
        Self {
            registry,
            notifier: None,
        }
    }

    /// Send notifications to `notifier`, replacing any previous one.
    pub fn notifier<N: Notifier<T> + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Send notifications to a closure.
    pub fn on_transition<F>(self, callback: F) -> Self
    where
        F: Fn(&TransitionEvent<'_, T>) + Send + Sync + 'static,
    {
        self.notifier(callback)
    }

    pub fn registry(&self) -> &TransitionRegistry<T> {
        &self.registry
    }

    /// Bind an operation by name. `None` if it is not registered.
    pub fn bind(&self, operation: &str) -> Option<GuardedOperation<'_, T>> {
        let name = self.registry.operations().find(|name| *name == operation)?;
        Some(GuardedOperation {
            executor: self,
            operation: name,
        })
    }

    /// Run `operation` on `instance`.
    ///
    /// Returns whatever the business logic returned. On any error other than
    /// [`TransitionError::Logic`] the field is left as it was; a logic error
    /// is returned after the rule's `on_error` state (if any) is committed and
    /// notified.
    pub fn execute(&self, instance: &mut T, operation: &str, args: &T::Args) -> CallResult<T> {
        let rule = self.lookup(instance, operation)?;
        let field = rule.field();
        let from = current_value(instance, rule)?;

        tracing::debug!(operation, field, from = from.name(), "transition rule matched");

        if let Some(index) = rule.first_failed_condition(instance, args) {
            let condition = rule.conditions()[index].name().map(str::to_string);
            tracing::debug!(operation, index, ?condition, "transition condition failed");
            return Err(TransitionError::ConditionFailed {
                operation: operation.to_string(),
                index,
                condition,
            });
        }

        let returned = match (rule.logic)(instance, args) {
            Ok(returned) => returned,
            Err(error) => return Err(self.fall_back(instance, rule, args, &from, error)),
        };

        let to = resolve_destination(instance, rule, &from, returned.as_ref())?;
        commit(instance, rule, &from, &to)?;

        tracing::info!(
            operation,
            field,
            from = from.name(),
            to = to.name(),
            "transition committed"
        );
        self.emit(TransitionEvent::new(
            instance,
            rule.operation(),
            args,
            field,
            &from,
            &to,
            EventKind::Succeeded {
                custom: rule.custom(),
            },
        ));

        Ok(returned)
    }

    /// Operations whose source accepts the instance's current state.
    ///
    /// Conditions are not evaluated since they need call arguments.
    pub fn allowed_operations(&self, instance: &T) -> Vec<&str> {
        self.registry
            .operations()
            .filter(|operation| self.lookup(instance, operation).is_ok())
            .collect()
    }

    /// Whether `operation` would pass lookup and every condition, without
    /// running its logic.
    pub fn can_call(&self, instance: &T, operation: &str, args: &T::Args) -> bool {
        self.lookup(instance, operation)
            .map(|rule| rule.first_failed_condition(instance, args).is_none())
            .unwrap_or(false)
    }

    fn lookup(
        &self,
        instance: &T,
        operation: &str,
    ) -> Result<&TransitionRule<T>, TransitionError<T::Error>> {
        let rules = self.registry.rules(operation).ok_or_else(|| {
            tracing::warn!(operation, "unknown guarded operation");
            TransitionError::UnknownOperation {
                operation: operation.to_string(),
            }
        })?;
        // Every rule of an operation drives the same field.
        let Some(first) = rules.first() else {
            return Err(TransitionError::UnknownOperation {
                operation: operation.to_string(),
            });
        };
        let current = current_value(instance, first)?;

        rules
            .iter()
            .find(|rule| rule.source().matches(&current))
            .ok_or_else(|| {
                tracing::debug!(operation, state = current.name(), "transition not allowed");
                TransitionError::NotAllowed {
                    operation: operation.to_string(),
                    field: first.field().to_string(),
                    state: current.name().to_string(),
                }
            })
    }

    /// Error path: commit `on_error` if configured, notify, and hand the
    /// logic's error back for the caller.
    fn fall_back(
        &self,
        instance: &mut T,
        rule: &TransitionRule<T>,
        args: &T::Args,
        from: &T::State,
        error: T::Error,
    ) -> TransitionError<T::Error> {
        let operation = rule.operation();
        if let Some(fallback) = rule.on_error() {
            match commit(instance, rule, from, fallback) {
                Ok(()) => {
                    tracing::warn!(
                        operation,
                        field = rule.field(),
                        from = from.name(),
                        to = fallback.name(),
                        %error,
                        "transition logic failed, error state committed"
                    );
                    self.emit(TransitionEvent::new(
                        instance,
                        operation,
                        args,
                        rule.field(),
                        from,
                        fallback,
                        EventKind::Failed { error: &error },
                    ));
                }
                Err(commit_error) => {
                    tracing::error!(
                        operation,
                        %error,
                        %commit_error,
                        "transition logic failed and error state could not be committed"
                    );
                }
            }
        } else {
            tracing::warn!(operation, %error, "transition logic failed");
        }
        TransitionError::Logic {
            operation: operation.to_string(),
            error,
        }
    }

    fn emit(&self, event: TransitionEvent<'_, T>) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(&event);
        }
    }
}

impl<T: Stateful> std::fmt::Debug for TransitionExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionExecutor")
            .field("registry", &self.registry)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

fn current_value<T: Stateful>(
    instance: &T,
    rule: &TransitionRule<T>,
) -> Result<T::State, TransitionError<T::Error>> {
    instance
        .state_field(rule.field())
        .map(|field| field.value().clone())
        .ok_or_else(|| TransitionError::FieldUnavailable {
            operation: rule.operation().to_string(),
            field: rule.field().to_string(),
        })
}

/// Turn the logic's return value into the state to commit.
fn resolve_destination<T: Stateful>(
    instance: &T,
    rule: &TransitionRule<T>,
    from: &T::State,
    returned: Option<&T::State>,
) -> Result<T::State, TransitionError<T::Error>> {
    let invalid = |destination: Option<&T::State>,
                   fault: DestinationFault|
     -> TransitionError<T::Error> {
        tracing::debug!(operation = rule.operation(), %fault, "transition destination refused");
        TransitionError::InvalidDestination {
            operation: rule.operation().to_string(),
            from_state: from.name().to_string(),
            destination: destination.map(|s| s.name().to_string()),
            fault,
        }
    };

    let to = match rule.destination() {
        DestinationSpec::Fixed(state) => state.clone(),
        DestinationSpec::OneOf(states) => match returned {
            None => return Err(invalid(None, DestinationFault::Missing)),
            Some(state) if !states.contains(state) => {
                return Err(invalid(Some(state), DestinationFault::NotInSet))
            }
            Some(state) => state.clone(),
        },
        DestinationSpec::Dynamic => match returned {
            None => return Err(invalid(None, DestinationFault::Missing)),
            Some(state) => state.clone(),
        },
    };

    let allowed = instance
        .state_field(rule.field())
        .is_some_and(|field| field.allows(&to));
    if !allowed {
        return Err(invalid(Some(&to), DestinationFault::NotAllowed));
    }
    if matches!(rule.source(), SourceSpec::AnyButSame) && to == *from {
        return Err(invalid(Some(&to), DestinationFault::SameAsSource));
    }
    Ok(to)
}

fn commit<T: Stateful>(
    instance: &mut T,
    rule: &TransitionRule<T>,
    from: &T::State,
    to: &T::State,
) -> Result<(), TransitionError<T::Error>> {
    let field = instance
        .state_field_mut(rule.field())
        .ok_or_else(|| TransitionError::FieldUnavailable {
            operation: rule.operation().to_string(),
            field: rule.field().to_string(),
        })?;
    field
        .commit(to.clone())
        .map_err(|_| TransitionError::InvalidDestination {
            operation: rule.operation().to_string(),
            from_state: from.name().to_string(),
            destination: Some(to.name().to_string()),
            fault: DestinationFault::NotAllowed,
        })
}

/// An operation bound to an executor, callable like a method.
#[derive(Debug)]
pub struct GuardedOperation<'e, T: Stateful> {
    executor: &'e TransitionExecutor<T>,
    operation: &'e str,
}

impl<'e, T: Stateful + 'static> GuardedOperation<'e, T> {
    pub fn name(&self) -> &str {
        self.operation
    }

    pub fn rules(&self) -> &'e [TransitionRule<T>] {
        self.executor
            .registry
            .rules(self.operation)
            .unwrap_or_default()
    }

    pub fn call(&self, instance: &mut T, args: &T::Args) -> CallResult<T> {
        self.executor.execute(instance, self.operation, args)
    }

    pub fn can_call(&self, instance: &T, args: &T::Args) -> bool {
        self.executor.can_call(instance, self.operation, args)
    }
}
