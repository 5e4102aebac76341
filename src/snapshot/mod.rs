//! Field snapshots for the persistence layer.
//!
//! The engine does not store anything. A [`FieldSnapshot`] is the value a
//! persistence layer saves. [`StateField::from_snapshot`] (or
//! [`TransitionRegistry::load_field`](crate::builder::TransitionRegistry::load_field))
//! builds a field from it, readonly or not. A live readonly field cannot be
//! restored over. Loading always refuses labels outside the allowed set.

use crate::core::{FieldSchema, State, StateField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of a field's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FieldSnapshot<S: State> {
    /// Snapshot format version
    pub version: u32,

    /// Name of the field the value was read from
    pub field: String,

    pub value: S,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl<S: State> FieldSnapshot<S> {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }
}

impl<S: State> StateField<S> {
    pub fn snapshot(&self) -> FieldSnapshot<S> {
        FieldSnapshot {
            version: SNAPSHOT_VERSION,
            field: self.name().to_string(),
            value: self.value().clone(),
            taken_at: Utc::now(),
        }
    }

    /// Build a field holding a stored value.
    ///
    /// This is how a persisted value reaches a readonly field. Once the field
    /// exists, only the executor moves it.
    pub fn from_snapshot(
        schema: &FieldSchema<S>,
        snapshot: &FieldSnapshot<S>,
    ) -> Result<Self, SnapshotError> {
        check_header(schema.name(), snapshot)?;
        let mut field = schema.instantiate();
        field.load(snapshot)?;
        Ok(field)
    }

    /// Load a stored value into a live writable field.
    pub fn restore(&mut self, snapshot: &FieldSnapshot<S>) -> Result<(), SnapshotError> {
        if self.is_readonly() {
            return Err(SnapshotError::ReadOnly {
                field: self.name().to_string(),
            });
        }
        check_header(self.name(), snapshot)?;
        self.load(snapshot)
    }

    fn load(&mut self, snapshot: &FieldSnapshot<S>) -> Result<(), SnapshotError> {
        self.commit(snapshot.value.clone())
            .map_err(|_| SnapshotError::InvalidState {
                field: self.name().to_string(),
                value: snapshot.value.name().to_string(),
            })?;
        tracing::debug!(field = self.name(), value = snapshot.value.name(), "field restored");
        Ok(())
    }
}

fn check_header<S: State>(field: &str, snapshot: &FieldSnapshot<S>) -> Result<(), SnapshotError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            supported: SNAPSHOT_VERSION,
        });
    }
    if snapshot.field != field {
        return Err(SnapshotError::FieldMismatch {
            expected: field.to_string(),
            found: snapshot.field.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_enum;

    state_enum! {
        enum Payment {
            Unpaid,
            Paid,
            Refunded,
        }
    }

    fn schema() -> FieldSchema<Payment> {
        FieldSchema::new("state", [Payment::Unpaid, Payment::Paid], Payment::Unpaid)
    }

    fn field() -> StateField<Payment> {
        StateField::from_schema(&schema()).unwrap()
    }

    #[test]
    fn from_snapshot_loads_readonly_field() {
        let mut source = field();
        source.commit(Payment::Paid).unwrap();
        let snapshot = source.snapshot();

        let loaded = StateField::from_snapshot(&schema(), &snapshot).unwrap();
        assert!(loaded.is_readonly());
        assert_eq!(loaded.value(), &Payment::Paid);
    }

    #[test]
    fn restore_onto_live_readonly_field_is_refused() {
        let mut snapshot = field().snapshot();
        snapshot.value = Payment::Paid;

        let mut live = field();
        assert!(live.write(Payment::Paid).is_err());
        let result = live.restore(&snapshot);

        assert!(matches!(result, Err(SnapshotError::ReadOnly { .. })));
        assert_eq!(live.value(), &Payment::Unpaid);
    }

    #[test]
    fn restore_onto_writable_field() {
        let mut snapshot = field().snapshot();
        snapshot.value = Payment::Paid;

        let mut live = StateField::from_schema(&schema().writable()).unwrap();
        live.restore(&snapshot).unwrap();
        assert_eq!(live.value(), &Payment::Paid);
    }

    #[test]
    fn loading_rejects_value_outside_field() {
        let mut snapshot = field().snapshot();
        snapshot.value = Payment::Refunded;

        let result = StateField::from_snapshot(&schema(), &snapshot);
        assert!(matches!(result, Err(SnapshotError::InvalidState { .. })));

        let mut writable = StateField::from_schema(&schema().writable()).unwrap();
        assert!(writable.restore(&snapshot).is_err());
        assert_eq!(writable.value(), &Payment::Unpaid);
    }

    #[test]
    fn loading_rejects_other_field_and_version() {
        let mut other = field().snapshot();
        other.field = "status".to_string();
        assert!(matches!(
            StateField::from_snapshot(&schema(), &other),
            Err(SnapshotError::FieldMismatch { .. })
        ));

        let mut future = field().snapshot();
        future.version = SNAPSHOT_VERSION + 1;
        assert!(matches!(
            StateField::from_snapshot(&schema(), &future),
            Err(SnapshotError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn json_encoding_keeps_value() {
        let snapshot = field().snapshot();
        let json = snapshot.to_json().unwrap();
        let decoded: FieldSnapshot<Payment> = FieldSnapshot::from_json(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn binary_encoding_keeps_value() {
        let mut source = field();
        source.commit(Payment::Paid).unwrap();
        let snapshot = source.snapshot();

        let bytes = snapshot.to_bytes().unwrap();
        let decoded: FieldSnapshot<Payment> = FieldSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.value, Payment::Paid);
        assert_eq!(decoded.field, "state");
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result = FieldSnapshot::<Payment>::from_json("not json");
        assert!(matches!(result, Err(SnapshotError::DeserializationFailed(_))));
    }
}
