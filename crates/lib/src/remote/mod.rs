//! The boundary between records and the store that persists them.
//!
//! A record saves by handing a [`SaveRequest`] (the reduced operations of one
//! flush, already encoded) to a [`RemoteStore`], and fetches by asking the
//! store for the raw fields of a record. Transports implement the trait;
//! [`InMemoryStore`] implements it without a network for tests and local use.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use url::Url;

use crate::{
    Result, codec,
    config::{ClientConfig, ConfigError},
    constants::{CREATED_AT, OBJECT_ID, UPDATED_AT},
};

pub mod errors;
pub mod in_memory;

pub use errors::RemoteError;
pub use in_memory::InMemoryStore;

/// HTTP method used by a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Creates a record
    Post,
    /// Updates an existing record
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Post => f.write_str("POST"),
            Method::Put => f.write_str("PUT"),
        }
    }
}

/// One flush of a record, ready to be transmitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub class_name: String,
    /// Absent when the record is created by this save
    pub object_id: Option<String>,
    /// One encoded operation per attribute key
    pub body: Map<String, JsonValue>,
}

impl SaveRequest {
    pub fn is_create(&self) -> bool {
        self.object_id.is_none()
    }

    pub fn method(&self) -> Method {
        if self.is_create() {
            Method::Post
        } else {
            Method::Put
        }
    }

    /// Path of the request relative to the server URL
    pub fn path(&self) -> String {
        match &self.object_id {
            Some(id) => format!("classes/{}/{}", self.class_name, id),
            None => format!("classes/{}", self.class_name),
        }
    }

    pub fn endpoint(&self, config: &ClientConfig) -> std::result::Result<Url, ConfigError> {
        config.endpoint(&self.path())
    }
}

/// Metadata the store returns for a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResponse {
    pub object_id: String,
    /// Only reported when the save created the record
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SaveResponse {
    /// Decodes the body the store answered `request` with.
    ///
    /// A create answers with `objectId` and `createdAt`; an update answers
    /// with `updatedAt` only.
    pub fn from_wire(request: &SaveRequest, body: &Map<String, JsonValue>) -> Result<Self> {
        let invalid = |reason: String| RemoteError::InvalidResponse { reason };
        match &request.object_id {
            None => {
                let object_id = body
                    .get(OBJECT_ID)
                    .ok_or_else(|| invalid(format!("missing {OBJECT_ID}")))?;
                let created_at = body
                    .get(CREATED_AT)
                    .ok_or_else(|| invalid(format!("missing {CREATED_AT}")))?;
                let created_at = codec::decode_timestamp(CREATED_AT, created_at)?;
                let updated_at = match body.get(UPDATED_AT) {
                    Some(json) => codec::decode_timestamp(UPDATED_AT, json)?,
                    None => created_at,
                };
                Ok(Self {
                    object_id: codec::decode_string(OBJECT_ID, object_id)?,
                    created_at: Some(created_at),
                    updated_at,
                })
            }
            Some(object_id) => {
                let updated_at = body
                    .get(UPDATED_AT)
                    .ok_or_else(|| invalid(format!("missing {UPDATED_AT}")))?;
                Ok(Self {
                    object_id: object_id.clone(),
                    created_at: None,
                    updated_at: codec::decode_timestamp(UPDATED_AT, updated_at)?,
                })
            }
        }
    }
}

/// A store that persists records.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Applies the operations in `request` to the stored record, creating it
    /// when the request carries no object id.
    async fn save(&self, request: SaveRequest) -> Result<SaveResponse>;

    /// Returns every stored field of a record, including `objectId`,
    /// `createdAt` and `updatedAt`.
    async fn fetch(&self, class_name: &str, object_id: &str) -> Result<Map<String, JsonValue>>;
}
