//! String-keyed dictionary values.
//!
//! The update protocol has no per-entry dictionary operations, so every
//! mutation of an attached dictionary is reported to its owner as a `Set` of
//! the whole dictionary.

use std::collections::BTreeMap;

use super::{Value, ValueError, link::ParentLink};
use crate::{
    Result,
    constants::{OP, TYPE},
    operation::Operation,
};

/// Rejects keys that the wire format reads as tags.
pub(crate) fn check_key(key: &str) -> std::result::Result<(), ValueError> {
    if key == OP || key == TYPE {
        return Err(ValueError::ReservedDictionaryKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// A map from string keys to values.
#[derive(Debug)]
pub struct Dictionary {
    contents: Option<BTreeMap<String, Value>>,
    parent: Option<ParentLink>,
}

impl Dictionary {
    /// Creates a new, materialized, empty dictionary
    pub fn new() -> Self {
        Self {
            contents: Some(BTreeMap::new()),
            parent: None,
        }
    }

    /// Creates a dictionary whose contents were never materialized
    pub fn unmaterialized() -> Self {
        Self {
            contents: None,
            parent: None,
        }
    }

    pub fn contents(&self) -> Option<&BTreeMap<String, Value>> {
        self.contents.as_ref()
    }

    pub fn is_materialized(&self) -> bool {
        self.contents.is_some()
    }

    pub fn len(&self) -> usize {
        self.contents.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.contents.as_ref().and_then(|c| c.get(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.contents.iter().flat_map(|c| c.iter())
    }

    pub(crate) fn attach(&mut self, link: ParentLink) {
        self.parent = Some(link);
    }

    pub(crate) fn detach(&mut self) -> Option<ParentLink> {
        self.parent.take()
    }

    /// Inserts `value` under `key`, returning the previous value.
    ///
    /// `__op` and `__type` are not accepted as keys, here or in any
    /// dictionary nested inside `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let value = value.into();
        check_key(&key)?;
        value.check_wire_keys()?;

        let mut next = self.contents.clone().unwrap_or_default();
        let previous = next.insert(key, value);
        self.commit(Some(next))?;
        Ok(previous)
    }

    /// Removes `key`, returning the value it held.
    ///
    /// Removing from an unmaterialized dictionary is a no-op that reports
    /// nothing to the owner.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        let Some(contents) = &self.contents else {
            return Ok(None);
        };
        let mut next = contents.clone();
        let previous = next.remove(key);
        self.commit(Some(next))?;
        Ok(previous)
    }

    fn commit(&mut self, next: Option<BTreeMap<String, Value>>) -> Result<()> {
        let previous = std::mem::replace(&mut self.contents, next);
        let Some(parent) = &self.parent else {
            return Ok(());
        };
        tracing::trace!(key = parent.key(), len = self.len(), "Dictionary mutated");

        if let Err(err) = parent.notify(Operation::Set(Value::Dictionary(self.clone()))) {
            self.contents = previous;
            return Err(err);
        }
        Ok(())
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Dictionary {
    fn clone(&self) -> Self {
        Self {
            contents: self.contents.clone(),
            parent: None,
        }
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.contents == other.contents
    }
}

impl From<BTreeMap<String, Value>> for Dictionary {
    fn from(contents: BTreeMap<String, Value>) -> Self {
        Self {
            contents: Some(contents),
            parent: None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Dictionary::from(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}
