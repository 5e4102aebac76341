//! Transition history.
//!
//! Immutable log of committed transitions, including error-fallback commits.
//! [`HistoryRecorder`](crate::engine::HistoryRecorder) fills one from the
//! engine's notifications.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// How a recorded transition ended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The logic returned and the destination was committed.
    Succeeded,
    /// The logic failed and the rule's error state was committed.
    Failed { error: String },
}

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use fsmguard::core::{Outcome, TransitionRecord};
/// use uuid::Uuid;
///
/// let record = TransitionRecord {
///     id: Uuid::new_v4(),
///     operation: "pay".to_string(),
///     field: "state".to_string(),
///     from: "unpaid".to_string(),
///     to: "paid".to_string(),
///     outcome: Outcome::Succeeded,
///     timestamp: Utc::now(),
/// };
/// assert!(record.succeeded());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: State> {
    /// Id of the event this record was made from
    pub id: Uuid,
    /// Guarded operation that ran
    pub operation: String,
    /// Field that changed
    pub field: String,
    /// Value before the call
    pub from: S,
    /// Value committed by the call
    pub to: S,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}

impl<S: State> TransitionRecord<S> {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded)
    }
}

/// Ordered history of committed transitions.
///
/// `record` returns a new history and leaves the receiver untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionHistory<S: State> {
    records: Vec<TransitionRecord<S>>,
}

impl<S: State> Default for TransitionHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> TransitionHistory<S> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: TransitionRecord<S>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Append in place.
    pub(crate) fn push(&mut self, record: TransitionRecord<S>) {
        self.records.push(record);
    }

    /// Values taken by `field`, in order: the first recorded source, then
    /// every committed destination.
    pub fn path(&self, field: &str) -> Vec<&S> {
        let records: Vec<&TransitionRecord<S>> =
            self.records.iter().filter(|r| r.field == field).collect();
        let mut path = Vec::new();
        if let Some(first) = records.first().copied() {
            path.push(&first.from);
        }
        for record in records {
            path.push(&record.to);
        }
        path
    }

    /// Records produced by the error-fallback path.
    pub fn failures(&self) -> impl Iterator<Item = &TransitionRecord<S>> {
        self.records.iter().filter(|r| !r.succeeded())
    }

    /// Time between the first and last record.
    ///
    /// `None` when empty or when the clock went backwards.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> &[TransitionRecord<S>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_enum;

    state_enum! {
        enum TestState {
            Pending,
            Approved,
            Archived,
            Failed,
        }
    }

    fn record(field: &str, from: TestState, to: TestState, outcome: Outcome) -> TransitionRecord<TestState> {
        TransitionRecord {
            id: Uuid::new_v4(),
            operation: "op".to_string(),
            field: field.to_string(),
            from,
            to,
            outcome,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: TransitionHistory<TestState> = TransitionHistory::new();
        assert!(history.is_empty());
        assert!(history.path("state").is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = TransitionHistory::new();
        let new_history = history.record(record(
            "state",
            TestState::Pending,
            TestState::Approved,
            Outcome::Succeeded,
        ));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn path_follows_one_field() {
        let history = TransitionHistory::new()
            .record(record("state", TestState::Pending, TestState::Approved, Outcome::Succeeded))
            .record(record("review", TestState::Pending, TestState::Failed, Outcome::Succeeded))
            .record(record("state", TestState::Approved, TestState::Archived, Outcome::Succeeded));

        let path = history.path("state");
        assert_eq!(
            path,
            vec![&TestState::Pending, &TestState::Approved, &TestState::Archived]
        );
        assert_eq!(history.path("review").len(), 2);
    }

    #[test]
    fn failures_only_lists_fallback_commits() {
        let history = TransitionHistory::new()
            .record(record("state", TestState::Pending, TestState::Approved, Outcome::Succeeded))
            .record(record(
                "state",
                TestState::Approved,
                TestState::Failed,
                Outcome::Failed {
                    error: "gateway down".to_string(),
                },
            ));

        let failures: Vec<_> = history.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].to, TestState::Failed);
    }

    #[test]
    fn single_record_has_duration_zero() {
        let history = TransitionHistory::new().record(record(
            "state",
            TestState::Pending,
            TestState::Approved,
            Outcome::Succeeded,
        ));

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = TransitionHistory::new().record(record(
            "state",
            TestState::Pending,
            TestState::Approved,
            Outcome::Succeeded,
        ));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: TransitionHistory<TestState> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.len(), 1);
        assert_eq!(deserialized.records()[0].operation, "op");
    }
}
