//! Error types for value operations.
//!
//! Raised by the binary arithmetic on values (`plus` / `minus`) and by the
//! typed accessors that expect a particular variant.

use thiserror::Error;

/// Structured error types for value operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Two values of incompatible variants were combined, or a value of the
    /// wrong variant was found where a specific one was required
    #[error("Value type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A dictionary key collides with a wire tag and would be read back as
    /// an operation or a special type
    #[error("Dictionary key '{key}' is reserved for the wire format")]
    ReservedDictionaryKey { key: String },
}

impl ValueError {
    /// Check if this error is a type mismatch
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, ValueError::TypeMismatch { .. })
    }

    /// Check if this error is a reserved dictionary key
    pub fn is_reserved_key(&self) -> bool {
        matches!(self, ValueError::ReservedDictionaryKey { .. })
    }

    pub(crate) fn mismatch(expected: &'static str, actual: &super::Value) -> Self {
        ValueError::TypeMismatch {
            expected,
            actual: actual.type_name(),
        }
    }
}

// Conversion from ValueError to the main Error type
impl From<ValueError> for crate::Error {
    fn from(err: ValueError) -> Self {
        crate::Error::Value(err)
    }
}
