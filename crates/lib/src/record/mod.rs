//! Records: named attributes plus the operations pending for them.
//!
//! A [`Record`] owns its attribute values and an [`OperationLog`]. Container
//! values stored in the record are linked back to the log, so mutating a list
//! obtained through [`Record::list_mut`] immediately updates the pending
//! operation for that key. Nothing is transmitted until the record is flushed,
//! and then only the reduced operations are sent, never the whole record.
//!
//! # Flushing
//!
//! [`Record::save`] drives a complete flush against a [`RemoteStore`]. The
//! steps are also available separately for callers that drive the transport
//! themselves:
//!
//! 1. [`Record::begin_flush`] seals the oldest pending set and returns a snapshot
//! 2. [`Record::save_request`] encodes the snapshot for the remote store
//! 3. [`Record::finish_flush`] or [`Record::abort_flush`] settles the snapshot
//!
//! Mutations issued between steps 1 and 3 go to a fresh set and are not
//! affected by the outcome.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::{
    Result, codec,
    constants::{CREATED_AT, OBJECT_ID, RESERVED_KEYS, UPDATED_AT},
    operation::Operation,
    remote::{RemoteStore, SaveRequest, SaveResponse},
    value::{Counter, Dictionary, List, MutationSink, Number, ParentLink, Reference, Value, ValueError},
};

pub mod errors;
pub mod flush;
pub mod log;

pub use errors::RecordError;
pub use flush::FlushSnapshot;
pub use log::{OperationLog, OperationSet};

/// A structured object of a given class, synchronized with a remote store.
///
/// ```
/// # use nimbus::{Record, operation::Operation};
/// let mut post = Record::new("Post");
/// post.list_mut("tags").unwrap().append("rust").unwrap();
/// post.list_mut("tags").unwrap().append("sdk").unwrap();
///
/// assert_eq!(
///     post.pending_operation("tags"),
///     Some(Operation::Add(vec!["rust".into(), "sdk".into()]))
/// );
/// ```
#[derive(Debug)]
pub struct Record {
    class_name: String,
    object_id: Option<String>,
    /// Identifies the record locally before the store assigns an object id
    local_id: Uuid,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    attributes: BTreeMap<String, Value>,
    log: Arc<OperationLog>,
}

impl Record {
    /// Creates a new, unsaved record of `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            local_id: Uuid::new_v4(),
            created_at: None,
            updated_at: None,
            attributes: BTreeMap::new(),
            log: Arc::new(OperationLog::new()),
        }
    }

    /// Creates a handle to an existing remote record whose attributes have
    /// not been fetched.
    pub fn with_object_id(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        let mut record = Self::new(class_name);
        record.object_id = Some(object_id.into());
        record
    }

    /// Builds a record from the fields returned by the remote store.
    pub fn from_server(class_name: impl Into<String>, fields: Map<String, JsonValue>) -> Result<Self> {
        let mut record = Self::new(class_name);
        record.merge_server_data(fields)?;
        Ok(record)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn local_id(&self) -> Uuid {
        self.local_id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true until the remote store has assigned an object id
    pub fn is_new(&self) -> bool {
        self.object_id.is_none()
    }

    /// A pointer to this record, usable as a value in other records.
    pub fn to_pointer(&self) -> std::result::Result<Reference, RecordError> {
        match &self.object_id {
            Some(id) => Ok(Reference::new(&self.class_name, id)),
            None => Err(RecordError::MissingObjectId {
                class_name: self.class_name.clone(),
            }),
        }
    }

    // ===== Attributes =====

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Iterates over attributes in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces the attribute under `key`.
    ///
    /// Container values are linked to this record so their later mutations are
    /// tracked. The value previously stored under `key` is unlinked.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        let mut value = value.into();

        self.log.notify_mutation(&key, Operation::Set(value.clone()))?;
        value.attach(ParentLink::new(&self.log, &key));
        if let Some(mut previous) = self.attributes.insert(key, value) {
            previous.detach();
        }
        Ok(())
    }

    /// Removes the attribute under `key`, returning its unlinked value.
    pub fn unset(&mut self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        self.log.notify_mutation(key, Operation::Delete)?;
        let mut previous = self.attributes.remove(key);
        if let Some(value) = previous.as_mut() {
            value.detach();
        }
        Ok(previous)
    }

    /// Adds `amount` to a numeric attribute.
    ///
    /// Absent and null attributes count as zero. Counters delegate to
    /// [`Counter::increment`].
    pub fn increment(&mut self, key: &str, amount: impl Into<Number>) -> Result<()> {
        validate_key(key)?;
        let amount = amount.into();
        match self.attributes.get_mut(key) {
            Some(Value::Counter(counter)) => counter.increment(amount),
            Some(Value::Number(current)) => {
                self.log.notify_mutation(key, Operation::Increment(amount))?;
                *current = *current + amount;
                Ok(())
            }
            None | Some(Value::Null) => {
                self.log.notify_mutation(key, Operation::Increment(amount))?;
                self.attributes.insert(key.to_string(), Value::Number(amount));
                Ok(())
            }
            Some(other) => Err(ValueError::mismatch("number", other).into()),
        }
    }

    /// Appends `element` to the list under `key`.
    pub fn add(&mut self, key: &str, element: impl Into<Value>) -> Result<()> {
        self.list_mut(key)?.append(element)
    }

    /// Appends `element` to the list under `key` unless already present.
    pub fn add_unique(&mut self, key: &str, element: impl Into<Value>) -> Result<()> {
        self.list_mut(key)?.append_unique(element)
    }

    /// Removes every occurrence of `element` from the list under `key`.
    ///
    /// An absent attribute stays absent; the removal is still recorded so the
    /// remote copy is updated.
    pub fn remove(&mut self, key: &str, element: impl Into<Value>) -> Result<()> {
        if self.attributes.contains_key(key) {
            return self.list_mut(key)?.remove(element);
        }
        validate_key(key)?;
        self.log
            .notify_mutation(key, Operation::Remove(vec![element.into()]))
    }

    /// The list under `key`, linked to this record.
    ///
    /// An absent attribute is created as an empty list, without recording
    /// anything until the list is mutated.
    pub fn list_mut(&mut self, key: &str) -> Result<&mut List> {
        match self.container_mut(key, || Value::List(List::new()))? {
            Value::List(list) => Ok(list),
            other => Err(ValueError::mismatch("list", other).into()),
        }
    }

    /// The dictionary under `key`, linked to this record.
    pub fn dictionary_mut(&mut self, key: &str) -> Result<&mut Dictionary> {
        match self.container_mut(key, || Value::Dictionary(Dictionary::new()))? {
            Value::Dictionary(dict) => Ok(dict),
            other => Err(ValueError::mismatch("dictionary", other).into()),
        }
    }

    /// The counter under `key`, linked to this record.
    pub fn counter_mut(&mut self, key: &str) -> Result<&mut Counter> {
        match self.container_mut(key, || Value::Counter(Counter::new()))? {
            Value::Counter(counter) => Ok(counter),
            other => Err(ValueError::mismatch("counter", other).into()),
        }
    }

    fn container_mut(&mut self, key: &str, create: impl FnOnce() -> Value) -> Result<&mut Value> {
        validate_key(key)?;
        let log = &self.log;
        Ok(self.attributes.entry(key.to_string()).or_insert_with(|| {
            let mut value = create();
            value.attach(ParentLink::new(log, key));
            value
        }))
    }

    // ===== Pending operations =====

    /// The reduced operation waiting to be flushed for `key`.
    ///
    /// While a flush is in flight this is the operation issued since the flush
    /// started.
    pub fn pending_operation(&self, key: &str) -> Option<Operation> {
        self.log.pending(key)
    }

    /// Keys with operations waiting to be flushed
    pub fn pending_keys(&self) -> Vec<String> {
        self.log.pending_keys()
    }

    /// Returns true if the record has unsaved changes (or was never saved)
    pub fn is_dirty(&self) -> bool {
        self.is_new() || self.log.is_dirty()
    }

    /// Returns true if `key` has operations waiting to be flushed
    pub fn is_key_dirty(&self, key: &str) -> bool {
        !self.log.history(key).is_empty()
    }

    /// The record's operation log
    pub fn operation_log(&self) -> &OperationLog {
        &self.log
    }

    // ===== Flushing =====

    /// Starts a flush of the oldest pending operations.
    pub fn begin_flush(&self) -> std::result::Result<FlushSnapshot, RecordError> {
        self.log.begin_flush(&self.class_name)
    }

    /// Encodes `snapshot` as a save request for this record.
    pub fn save_request(&self, snapshot: &FlushSnapshot) -> SaveRequest {
        SaveRequest {
            class_name: self.class_name.clone(),
            object_id: self.object_id.clone(),
            body: snapshot.to_wire(),
        }
    }

    /// Completes a successful flush: exactly the snapshotted operations are
    /// discarded, and the store's metadata is recorded.
    pub fn finish_flush(&mut self, snapshot: FlushSnapshot, response: SaveResponse) -> Result<()> {
        self.log.finish_flush(snapshot.id())?;
        if self.object_id.is_none() {
            self.object_id = Some(response.object_id);
        }
        if response.created_at.is_some() {
            self.created_at = response.created_at;
        }
        self.updated_at = Some(response.updated_at);
        Ok(())
    }

    /// Settles a failed flush: the snapshotted operations are queued again.
    pub fn abort_flush(&mut self, snapshot: FlushSnapshot) -> Result<()> {
        self.log.abort_flush(snapshot.id())?;
        Ok(())
    }

    /// Flushes the oldest pending operations to `store`.
    ///
    /// A record with an operation set left over from an earlier failure needs
    /// one call per queued set.
    pub async fn save(&mut self, store: &dyn RemoteStore) -> Result<()> {
        let snapshot = self.begin_flush()?;
        let request = self.save_request(&snapshot);
        tracing::debug!(
            class_name = %self.class_name,
            object_id = ?self.object_id,
            fields = request.body.len(),
            "Saving record"
        );

        match store.save(request).await {
            Ok(response) => self.finish_flush(snapshot, response),
            Err(err) => {
                self.abort_flush(snapshot)?;
                Err(err)
            }
        }
    }

    /// Fetches the remote copy of this record and merges it in.
    pub async fn fetch(&mut self, store: &dyn RemoteStore) -> Result<()> {
        let object_id = self.to_pointer()?.object_id;
        let fields = store.fetch(&self.class_name, &object_id).await?;
        self.merge_server_data(fields)
    }

    /// Replaces local attributes with the remote store's copy.
    ///
    /// Pending operations are replayed on top of the remote values (or on top
    /// of nothing, for keys the store does not have) so local changes that
    /// were not flushed yet remain visible. Local attributes that the store
    /// does not know and that have no pending operations are dropped. Nothing
    /// changes if any field fails to decode or a pending operation cannot be
    /// replayed onto the fetched value.
    pub fn merge_server_data(&mut self, fields: Map<String, JsonValue>) -> Result<()> {
        let mut decoded = BTreeMap::new();
        let mut object_id = None;
        let mut created_at = None;
        let mut updated_at = None;

        for (key, field) in &fields {
            match key.as_str() {
                OBJECT_ID => object_id = Some(codec::decode_string(key, field)?),
                CREATED_AT => created_at = Some(codec::decode_timestamp(key, field)?),
                UPDATED_AT => updated_at = Some(codec::decode_timestamp(key, field)?),
                key if RESERVED_KEYS.contains(&key) => {}
                _ => {
                    decoded.insert(key.clone(), codec::decode_value(field)?);
                }
            }
        }

        let pending = self.log.pending_keys();
        for key in &pending {
            let mut estimate = decoded.remove(key);
            for operation in self.log.history(key) {
                estimate = operation.apply(estimate.as_ref()).inspect_err(|err| {
                    tracing::warn!(key = %key, error = %err, "Pending operation does not apply to fetched value");
                })?;
            }
            if let Some(value) = estimate {
                decoded.insert(key.clone(), value);
            }
        }

        self.attributes
            .retain(|key, _| decoded.contains_key(key) && !pending.contains(key));

        for (key, mut value) in decoded {
            value.attach(ParentLink::new(&self.log, &key));
            if let Some(mut previous) = self.attributes.insert(key, value) {
                previous.detach();
            }
        }

        if object_id.is_some() {
            self.object_id = object_id;
        }
        self.created_at = created_at.or(self.created_at);
        self.updated_at = updated_at.or(self.updated_at);
        tracing::debug!(
            class_name = %self.class_name,
            fields = fields.len(),
            pending = pending.len(),
            "Merged server data"
        );
        Ok(())
    }
}

/// Checks that `key` can be used as an attribute name.
fn validate_key(key: &str) -> std::result::Result<(), RecordError> {
    if RESERVED_KEYS.contains(&key) {
        return Err(RecordError::ReservedKey {
            key: key.to_string(),
        });
    }
    let mut chars = key.chars();
    match chars.next() {
        None => Err(RecordError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        }),
        Some(first) if !first.is_ascii_alphabetic() => Err(RecordError::InvalidKey {
            key: key.to_string(),
            reason: "key must start with a letter",
        }),
        Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Err(RecordError::InvalidKey {
                key: key.to_string(),
                reason: "key may only contain letters, digits and underscores",
            })
        }
        Some(_) => Ok(()),
    }
}
