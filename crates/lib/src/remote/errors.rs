//! Error types for remote store interactions.

use thiserror::Error;

/// Structured error types for remote store interactions.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The store has no record with this id
    #[error("{class_name} record '{object_id}' not found")]
    ObjectNotFound {
        class_name: String,
        object_id: String,
    },

    /// The store refused the request
    #[error("Request rejected by remote store: {reason}")]
    Rejected { reason: String },

    /// The store answered with something that is not a valid response
    #[error("Invalid response from remote store: {reason}")]
    InvalidResponse { reason: String },
}

impl RemoteError {
    /// Check if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::ObjectNotFound { .. })
    }

    /// Check if the store refused the request
    pub fn is_rejected(&self) -> bool {
        matches!(self, RemoteError::Rejected { .. })
    }
}

// Conversion from RemoteError to the main Error type
impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        crate::Error::Remote(err)
    }
}
