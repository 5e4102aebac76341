//! Transition notifications.
//!
//! The executor emits one [`TransitionEvent`] per committed transition into a
//! single injected [`Notifier`]. It never subscribes to anything.

use crate::builder::Metadata;
use crate::core::{Outcome, State, Stateful, TransitionHistory, TransitionRecord};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// What happened, with the payload specific to each outcome.
#[derive(Debug)]
pub enum EventKind<'a, E> {
    /// The destination was committed. Carries the rule's metadata.
    Succeeded { custom: &'a Metadata },
    /// The logic failed and the rule's error state was committed.
    Failed { error: &'a E },
}

/// Notification emitted after a transition commits.
#[derive(Debug)]
pub struct TransitionEvent<'a, T: Stateful> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub instance: &'a T,
    pub operation: &'a str,
    /// Arguments the call was made with
    pub args: &'a T::Args,
    pub field: &'a str,
    /// Value before the call
    pub from: &'a T::State,
    /// Value committed by the call
    pub to: &'a T::State,
    pub kind: EventKind<'a, T::Error>,
}

impl<'a, T: Stateful> TransitionEvent<'a, T> {
    pub(crate) fn new(
        instance: &'a T,
        operation: &'a str,
        args: &'a T::Args,
        field: &'a str,
        from: &'a T::State,
        to: &'a T::State,
        kind: EventKind<'a, T::Error>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            instance,
            operation,
            args,
            field,
            from,
            to,
            kind,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.kind, EventKind::Succeeded { .. })
    }

    /// Owned copy of the event without the instance reference.
    pub fn to_record(&self) -> TransitionRecord<T::State> {
        TransitionRecord {
            id: self.id,
            operation: self.operation.to_string(),
            field: self.field.to_string(),
            from: self.from.clone(),
            to: self.to.clone(),
            outcome: match &self.kind {
                EventKind::Succeeded { .. } => Outcome::Succeeded,
                EventKind::Failed { error } => Outcome::Failed {
                    error: error.to_string(),
                },
            },
            timestamp: self.timestamp,
        }
    }
}

/// Receiver of transition notifications.
///
/// Implemented for any `Fn(&TransitionEvent<'_, T>) + Send + Sync` closure.
pub trait Notifier<T: Stateful>: Send + Sync {
    fn notify(&self, event: &TransitionEvent<'_, T>);
}

impl<T, F> Notifier<T> for F
where
    T: Stateful,
    F: Fn(&TransitionEvent<'_, T>) + Send + Sync,
{
    fn notify(&self, event: &TransitionEvent<'_, T>) {
        self(event)
    }
}

/// Notifier that keeps a [`TransitionHistory`] of everything it receives.
///
/// Clones share the same history.
#[derive(Debug)]
pub struct HistoryRecorder<S: State> {
    history: Arc<Mutex<TransitionHistory<S>>>,
}

impl<S: State> Clone for HistoryRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            history: Arc::clone(&self.history),
        }
    }
}

impl<S: State> Default for HistoryRecorder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> HistoryRecorder<S> {
    pub fn new() -> Self {
        Self {
            history: Arc::new(Mutex::new(TransitionHistory::new())),
        }
    }

    /// Snapshot of the history recorded so far.
    pub fn history(&self) -> TransitionHistory<S> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<T: Stateful> Notifier<T> for HistoryRecorder<T::State> {
    fn notify(&self, event: &TransitionEvent<'_, T>) {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.to_record());
    }
}
