//!
//! Nimbus: the client-side record layer of a backend-as-a-service SDK.
//!
//! Records are mutated locally and synchronized with a remote store by sending
//! only the operations issued since the last save, merged per attribute into
//! as few operations as possible.
//!
//! ## Core Concepts
//!
//! * **Values (`value::Value`)**: Everything storable under a record attribute: atomic values, containers (lists, dictionaries, counters) and references to other data.
//! * **Operations (`operation::Operation`)**: Descriptions of a single attribute mutation, such as `Set`, `Increment` or `AddUnique`.
//! * **Reducer (`operation::reduce`)**: Merges a pending operation with a newly issued one into the single operation with the same combined effect, or rejects the pair as incompatible.
//! * **Records (`record::Record`)**: Named attributes plus the log of pending operations. Containers stored in a record report their mutations to it.
//! * **Remote stores (`remote::RemoteStore`)**: The persistence boundary. Records flush their pending operations to a store and fetch their fields back from it.
//! * **Wire codec (`codec`)**: The JSON representation of values and operations shared with the store.

pub mod codec;
pub mod config;
pub mod constants;
pub mod operation;
pub mod record;
pub mod remote;
pub mod value;

/// Re-export the core types for easier access.
pub use operation::Operation;
pub use record::Record;
pub use value::{List, Value};

/// Result type used throughout the Nimbus library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Nimbus library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured value errors from the value module
    #[error(transparent)]
    Value(value::ValueError),

    /// Structured operation errors from the operation module
    #[error(transparent)]
    Operation(operation::OperationError),

    /// Structured record errors from the record module
    #[error(transparent)]
    Record(record::RecordError),

    /// Structured wire format errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured remote store errors from the remote module
    #[error(transparent)]
    Remote(remote::RemoteError),

    /// Configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Value(_) => "value",
            Error::Operation(_) => "operation",
            Error::Record(_) => "record",
            Error::Codec(_) => "codec",
            Error::Remote(_) => "remote",
            Error::Config(_) => "config",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a value type mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Value(value_err) => value_err.is_type_mismatch(),
            _ => false,
        }
    }

    /// Check if this error is an incompatible pair of operations.
    pub fn is_incompatible_operation(&self) -> bool {
        match self {
            Error::Operation(op_err) => op_err.is_incompatible(),
            _ => false,
        }
    }

    /// Check if this error was caused by an invalid attribute key.
    pub fn is_key_error(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_key_error(),
            _ => false,
        }
    }

    /// Check if this error concerns the flush protocol.
    pub fn is_flush_error(&self) -> bool {
        match self {
            Error::Record(record_err) => record_err.is_flush_error(),
            _ => false,
        }
    }

    /// Check if this error came from the remote store.
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Error::Remote(_))
    }
}
