//! Constants used throughout the Nimbus library.
//!
//! Central definitions for the field names of the wire format and the
//! attribute keys the remote store manages itself.

/// Tag field marking an object as an operation.
pub const OP: &str = "__op";

/// Tag field marking an object as a typed value (date, bytes, pointer, ...).
pub const TYPE: &str = "__type";

/// Object id assigned by the remote store.
pub const OBJECT_ID: &str = "objectId";

/// Creation timestamp assigned by the remote store.
pub const CREATED_AT: &str = "createdAt";

/// Last update timestamp assigned by the remote store.
pub const UPDATED_AT: &str = "updatedAt";

/// Access control list, managed outside the attribute model.
pub const ACL: &str = "ACL";

/// Attribute keys that cannot be set through a record.
pub const RESERVED_KEYS: &[&str] = &[OBJECT_ID, CREATED_AT, UPDATED_AT, ACL];

/// Length of object ids generated by the in-memory store.
pub const OBJECT_ID_LEN: usize = 10;

/// Environment variable holding the server URL.
pub const ENV_SERVER_URL: &str = "NIMBUS_SERVER_URL";

/// Environment variable holding the application id.
pub const ENV_APPLICATION_ID: &str = "NIMBUS_APPLICATION_ID";
