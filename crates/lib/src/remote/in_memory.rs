//! A remote store kept entirely in memory.
//!
//! Operations are applied with the same semantics the server uses, so records
//! saved here and fetched back look the way they would after a round trip to a
//! real store. Every save request is kept for inspection.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::Mutex;

use super::{RemoteError, RemoteStore, SaveRequest, SaveResponse};
use crate::{
    Result, codec,
    constants::{CREATED_AT, OBJECT_ID, OBJECT_ID_LEN, UPDATED_AT},
    value::Value,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    fields: Map<String, JsonValue>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    /// (class name, object id) -> record
    records: HashMap<(String, String), StoredRecord>,
    requests: Vec<SaveRequest>,
    fail_next_save: Option<String>,
}

/// An in-memory [`RemoteStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next save fail with [`RemoteError::Rejected`].
    pub async fn fail_next_save(&self, reason: impl Into<String>) {
        self.state.lock().await.fail_next_save = Some(reason.into());
    }

    /// Every save request received so far, oldest first
    pub async fn requests(&self) -> Vec<SaveRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Number of records stored
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stores `fields` as a record directly, bypassing the operation protocol.
    ///
    /// Returns the generated object id.
    pub async fn insert(&self, class_name: &str, fields: Map<String, JsonValue>) -> String {
        let mut state = self.state.lock().await;
        let object_id = generate_object_id();
        let now = Utc::now();
        state.records.insert(
            (class_name.to_string(), object_id.clone()),
            StoredRecord {
                fields,
                created_at: now,
                updated_at: now,
            },
        );
        object_id
    }
}

fn generate_object_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OBJECT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Applies every encoded operation of `body` to `fields`.
///
/// Nothing is changed unless every operation applies.
fn apply_body(fields: &Map<String, JsonValue>, body: &Map<String, JsonValue>) -> Result<Map<String, JsonValue>> {
    let mut next = fields.clone();
    for (key, encoded) in body {
        let operation = codec::decode_operation(encoded)?;
        let current = next.get(key).map(codec::decode_value).transpose()?;
        let updated = operation
            .apply(current.as_ref())
            .map_err(|err| RemoteError::Rejected {
                reason: format!("{key}: {err}"),
            })?;
        match updated {
            Some(value) => {
                next.insert(key.clone(), codec::encode_value(&value));
            }
            None => {
                next.remove(key);
            }
        }
    }
    Ok(next)
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn save(&self, request: SaveRequest) -> Result<SaveResponse> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());
        if let Some(reason) = state.fail_next_save.take() {
            tracing::debug!(class_name = %request.class_name, %reason, "Rejecting save");
            return Err(RemoteError::Rejected { reason }.into());
        }

        let now = Utc::now();
        match &request.object_id {
            None => {
                let fields = apply_body(&Map::new(), &request.body)?;
                let object_id = generate_object_id();
                state.records.insert(
                    (request.class_name.clone(), object_id.clone()),
                    StoredRecord {
                        fields,
                        created_at: now,
                        updated_at: now,
                    },
                );
                tracing::info!(class_name = %request.class_name, %object_id, "Created record");
                Ok(SaveResponse {
                    object_id,
                    created_at: Some(now),
                    updated_at: now,
                })
            }
            Some(object_id) => {
                let key = (request.class_name.clone(), object_id.clone());
                let record = state
                    .records
                    .get_mut(&key)
                    .ok_or_else(|| RemoteError::ObjectNotFound {
                        class_name: request.class_name.clone(),
                        object_id: object_id.clone(),
                    })?;
                record.fields = apply_body(&record.fields, &request.body)?;
                record.updated_at = now;
                tracing::debug!(
                    class_name = %request.class_name,
                    %object_id,
                    fields = request.body.len(),
                    "Updated record"
                );
                Ok(SaveResponse {
                    object_id: object_id.clone(),
                    created_at: None,
                    updated_at: now,
                })
            }
        }
    }

    async fn fetch(&self, class_name: &str, object_id: &str) -> Result<Map<String, JsonValue>> {
        let state = self.state.lock().await;
        let record = state
            .records
            .get(&(class_name.to_string(), object_id.to_string()))
            .ok_or_else(|| RemoteError::ObjectNotFound {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            })?;

        let mut fields = record.fields.clone();
        fields.insert(OBJECT_ID.to_string(), object_id.into());
        fields.insert(
            CREATED_AT.to_string(),
            codec::encode_timestamp(&record.created_at).into(),
        );
        fields.insert(
            UPDATED_AT.to_string(),
            codec::encode_timestamp(&record.updated_at).into(),
        );
        Ok(fields)
    }
}

impl InMemoryStore {
    /// Decoded value of one stored field, mainly for assertions in tests.
    pub async fn field(&self, class_name: &str, object_id: &str, key: &str) -> Result<Option<Value>> {
        let fields = self.fetch(class_name, object_id).await?;
        Ok(fields.get(key).map(codec::decode_value).transpose()?)
    }
}
