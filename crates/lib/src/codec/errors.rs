//! Error types for the wire codec.

use thiserror::Error;

/// Structured error types for decoding wire data.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A typed object carried a `__type` tag this client does not know
    #[error("Unknown value type '{type_name}'")]
    UnknownType { type_name: String },

    /// An operation object carried an `__op` tag this client does not know
    #[error("Unknown operation '{name}'")]
    UnknownOperation { name: String },

    /// A required field was absent from a typed object
    #[error("Missing field '{field}' in {context}")]
    MissingField {
        context: String,
        field: &'static str,
    },

    /// A field was present but had the wrong shape
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl CodecError {
    /// Check if this error is caused by a tag this client does not understand
    pub fn is_unknown_tag(&self) -> bool {
        matches!(
            self,
            CodecError::UnknownType { .. } | CodecError::UnknownOperation { .. }
        )
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// Conversion from CodecError to the main Error type
impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
