//! Snapshots handed out when a record starts flushing its pending operations.

use serde_json::{Map, Value as JsonValue};

use super::OperationSet;
use crate::codec;

/// A frozen copy of the operation set being transmitted by one flush.
///
/// The snapshot identifies the flush: completing or aborting it with
/// [`Record::finish_flush`](super::Record::finish_flush) /
/// [`Record::abort_flush`](super::Record::abort_flush) acts on exactly the
/// operations it contains, whatever was issued in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushSnapshot {
    id: u64,
    operations: OperationSet,
}

impl FlushSnapshot {
    pub(crate) fn new(id: u64, operations: OperationSet) -> Self {
        Self { id, operations }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn operations(&self) -> &OperationSet {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Encodes the operations as the body of a partial update: one wire
    /// operation per key.
    pub fn to_wire(&self) -> Map<String, JsonValue> {
        self.operations
            .iter()
            .map(|(key, operation)| (key.clone(), codec::encode_operation(operation)))
            .collect()
    }
}
