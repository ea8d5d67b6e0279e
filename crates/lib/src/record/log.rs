//! Pending operations of a record.
//!
//! An [`OperationSet`] maps each key to one reduced operation. A record's
//! [`OperationLog`] is a queue of such sets: mutations always reduce into the
//! newest set, and a flush transmits the oldest one. Starting a flush seals the
//! set being flushed and opens a fresh one, so operations issued while the
//! flush is in flight are kept apart and survive its completion.

use std::{
    collections::{BTreeMap, VecDeque, btree_map},
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{FlushSnapshot, RecordError};
use crate::{
    Result,
    operation::{Operation, reduce},
    value::MutationSink,
};

/// One reduced operation per key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSet {
    operations: BTreeMap<String, Operation>,
}

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Operation> {
        self.operations.get(key)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.operations.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Operation> {
        self.operations.iter()
    }

    /// Reduces `operation` into the entry for `key`.
    ///
    /// On error the entry is left as it was.
    pub fn apply(&mut self, key: &str, operation: Operation) -> Result<()> {
        operation.check_wire_keys()?;
        match reduce(key, self.operations.get(key), operation)? {
            Some(reduced) => {
                self.operations.insert(key.to_string(), reduced);
            }
            None => {
                self.operations.remove(key);
            }
        }
        Ok(())
    }

    /// Reduces every entry of `newer` on top of this set, as if the newer
    /// operations had been issued after this set's.
    ///
    /// Either every key folds or nothing changes; the first incompatible key
    /// is returned as the error.
    fn fold(&self, newer: &OperationSet) -> Result<OperationSet> {
        let mut folded = self.clone();
        for (key, operation) in newer.iter() {
            folded.apply(key, operation.clone())?;
        }
        Ok(folded)
    }
}

impl<'a> IntoIterator for &'a OperationSet {
    type Item = (&'a String, &'a Operation);
    type IntoIter = btree_map::Iter<'a, String, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
struct LogState {
    /// Never empty; the back set receives new mutations
    sets: VecDeque<OperationSet>,
    in_flight: Option<u64>,
    next_flush_id: u64,
}

/// The queue of operation sets owned by a record.
///
/// Container values hold a weak reference to the log through their
/// [`ParentLink`](crate::value::ParentLink); the log is the record's
/// [`MutationSink`].
#[derive(Debug)]
pub struct OperationLog {
    state: Mutex<LogState>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LogState {
                sets: VecDeque::from([OperationSet::new()]),
                in_flight: None,
                next_flush_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The pending operation for `key` in the set receiving new mutations
    pub fn pending(&self, key: &str) -> Option<Operation> {
        self.lock().sets.back().and_then(|set| set.get(key)).cloned()
    }

    /// Every queued operation for `key`, oldest first
    pub fn history(&self, key: &str) -> Vec<Operation> {
        self.lock()
            .sets
            .iter()
            .filter_map(|set| set.get(key))
            .cloned()
            .collect()
    }

    /// Keys with queued operations in any set, sorted
    pub fn pending_keys(&self) -> Vec<String> {
        let state = self.lock();
        let mut keys: Vec<String> = state
            .sets
            .iter()
            .flat_map(|set| set.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Returns true if any operation is queued
    pub fn is_dirty(&self) -> bool {
        self.lock().sets.iter().any(|set| !set.is_empty())
    }

    /// Number of queued sets, including the one receiving new mutations
    pub fn queued_sets(&self) -> usize {
        self.lock().sets.len()
    }

    pub fn is_flushing(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Seals the oldest set and hands out a snapshot of it for transmission.
    pub(crate) fn begin_flush(&self, class_name: &str) -> std::result::Result<FlushSnapshot, RecordError> {
        let mut state = self.lock();
        if state.in_flight.is_some() {
            return Err(RecordError::FlushInProgress {
                class_name: class_name.to_string(),
            });
        }
        if state.sets.len() == 1 {
            state.sets.push_back(OperationSet::new());
        }

        let flush_id = state.next_flush_id;
        state.next_flush_id += 1;
        state.in_flight = Some(flush_id);

        let operations = state.sets.front().cloned().unwrap_or_default();
        tracing::debug!(
            class_name,
            flush_id,
            operations = operations.len(),
            "Began flush"
        );
        Ok(FlushSnapshot::new(flush_id, operations))
    }

    /// Discards the set that was transmitted by flush `flush_id`.
    pub(crate) fn finish_flush(&self, flush_id: u64) -> std::result::Result<(), RecordError> {
        let mut state = self.lock();
        Self::end_flush(&mut state, flush_id)?;
        state.sets.pop_front();
        if state.sets.is_empty() {
            state.sets.push_back(OperationSet::new());
        }
        tracing::debug!(flush_id, remaining = state.sets.len(), "Finished flush");
        Ok(())
    }

    /// Returns the set of a failed flush to the queue.
    ///
    /// The failed set is folded under the operations issued since it was
    /// sealed when every key reduces; otherwise the sets stay separate and the
    /// failed one is transmitted first by the next flush.
    pub(crate) fn abort_flush(&self, flush_id: u64) -> std::result::Result<(), RecordError> {
        let mut state = self.lock();
        Self::end_flush(&mut state, flush_id)?;
        if state.sets.len() < 2 {
            return Ok(());
        }

        let folded = state.sets[0].fold(&state.sets[1]);
        match folded {
            Ok(folded) => {
                state.sets.pop_front();
                state.sets[0] = folded;
                tracing::debug!(flush_id, "Aborted flush, operations folded back");
            }
            Err(err) => {
                tracing::warn!(
                    flush_id,
                    error = %err,
                    "Aborted flush could not be folded into newer operations, keeping it queued"
                );
            }
        }
        Ok(())
    }

    fn end_flush(state: &mut LogState, flush_id: u64) -> std::result::Result<(), RecordError> {
        if state.in_flight != Some(flush_id) {
            return Err(RecordError::UnknownFlush { flush_id });
        }
        state.in_flight = None;
        Ok(())
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationSink for OperationLog {
    fn notify_mutation(&self, key: &str, operation: Operation) -> Result<()> {
        let mut state = self.lock();
        match state.sets.back_mut() {
            Some(set) => set.apply(key, operation),
            None => {
                let mut set = OperationSet::new();
                set.apply(key, operation)?;
                state.sets.push_back(set);
                Ok(())
            }
        }
    }
}
