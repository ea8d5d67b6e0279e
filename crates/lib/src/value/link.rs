//! Upward notification from container values to the record that owns them.
//!
//! A record owns its containers. A container never owns its record: it holds a
//! [`ParentLink`], which is a weak handle to a [`MutationSink`] plus the
//! attribute key the container is stored under. When the owner goes away the
//! link simply stops delivering notifications.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{Result, operation::Operation};

/// Capability implemented by owners of container values.
///
/// `notify_mutation` is called synchronously by a container's mutator after the
/// container has already updated its own contents. An error returned here is
/// propagated back out of the mutating call, which then restores the previous
/// contents.
pub trait MutationSink: Send + Sync {
    /// Receive a raw operation issued against `key`.
    fn notify_mutation(&self, key: &str, operation: Operation) -> Result<()>;
}

/// Weak registration of a container with its owner.
#[derive(Clone)]
pub struct ParentLink {
    sink: Weak<dyn MutationSink>,
    key: String,
}

impl ParentLink {
    /// Creates a link notifying `sink` of mutations under `key`.
    pub fn new<S: MutationSink + 'static>(sink: &Arc<S>, key: impl Into<String>) -> Self {
        let sink: Arc<dyn MutationSink> = sink.clone();
        Self {
            sink: Arc::downgrade(&sink),
            key: key.into(),
        }
    }

    /// The attribute key this link reports under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true while the owner is still alive.
    pub fn is_live(&self) -> bool {
        self.sink.strong_count() > 0
    }

    /// Forwards `operation` to the owner.
    ///
    /// A link whose owner has been dropped accepts every operation: there is no
    /// longer anyone to synchronize with.
    pub fn notify(&self, operation: Operation) -> Result<()> {
        match self.sink.upgrade() {
            Some(sink) => sink.notify_mutation(&self.key, operation),
            None => {
                tracing::warn!(key = %self.key, kind = %operation.kind(), "Owner of container dropped, mutation not recorded");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("key", &self.key)
            .field("live", &self.is_live())
            .finish()
    }
}
