//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot version is not supported by this version
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Snapshot was taken from another field
    #[error("Snapshot of field '{found}' cannot restore field '{expected}'")]
    FieldMismatch { expected: String, found: String },

    /// No field of that name is declared
    #[error("Snapshot names unknown field '{field}'")]
    UnknownField { field: String },

    /// A live readonly field only changes through guarded calls
    #[error("Field '{field}' is readonly and cannot be restored in place")]
    ReadOnly { field: String },

    /// Stored value is not an allowed value of the field
    #[error("Stored value '{value}' is not allowed for field '{field}'")]
    InvalidState { field: String, value: String },
}
