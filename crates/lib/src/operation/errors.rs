//! Error types for operations and their reduction.

use thiserror::Error;

use super::OperationKind;

/// Structured error types for operation handling.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Two operations issued against the same key before a flush cannot be
    /// expressed as a single operation
    #[error("Cannot combine {incoming} with pending {pending} on key '{key}'")]
    IncompatibleOperation {
        key: String,
        pending: OperationKind,
        incoming: OperationKind,
    },

    /// An operation was applied to a value of a shape it cannot act on
    #[error("Cannot apply {operation} to a value of type {actual}")]
    InvalidTarget {
        operation: OperationKind,
        actual: &'static str,
    },
}

impl OperationError {
    /// Check if this error is a rejected operation combination
    pub fn is_incompatible(&self) -> bool {
        matches!(self, OperationError::IncompatibleOperation { .. })
    }

    /// Get the key if this error concerns a specific key
    pub fn key(&self) -> Option<&str> {
        match self {
            OperationError::IncompatibleOperation { key, .. } => Some(key),
            _ => None,
        }
    }
}

// Conversion from OperationError to the main Error type
impl From<OperationError> for crate::Error {
    fn from(err: OperationError) -> Self {
        crate::Error::Operation(err)
    }
}
