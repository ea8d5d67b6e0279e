//! Error types for record operations.

use thiserror::Error;

/// Structured error types for record operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Attribute key is not a valid field name
    #[error("Invalid attribute key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// Attribute key is managed by the remote store
    #[error("Attribute key '{key}' is reserved")]
    ReservedKey { key: String },

    /// A flush was started while another one is still in flight
    #[error("A flush is already in flight for this {class_name} record")]
    FlushInProgress { class_name: String },

    /// A flush completion did not match the flush in flight
    #[error("Flush {flush_id} is not in flight")]
    UnknownFlush { flush_id: u64 },

    /// The record has not been saved yet and has no object id
    #[error("{class_name} record has no object id")]
    MissingObjectId { class_name: String },
}

impl RecordError {
    /// Check if this error concerns an attribute key
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            RecordError::InvalidKey { .. } | RecordError::ReservedKey { .. }
        )
    }

    /// Check if this error concerns the flush protocol
    pub fn is_flush_error(&self) -> bool {
        matches!(
            self,
            RecordError::FlushInProgress { .. } | RecordError::UnknownFlush { .. }
        )
    }
}

// Conversion from RecordError to the main Error type
impl From<RecordError> for crate::Error {
    fn from(err: RecordError) -> Self {
        crate::Error::Record(err)
    }
}
