//! Operation reduction.
//!
//! Between two flushes a record keeps a single operation per key. Each newly
//! issued operation is reduced against the pending one into the single
//! operation equivalent to applying both in order, or rejected when no single
//! operation can express the pair.
//!
//! Reduction dispatches on the family of the pending operation:
//!
//! | pending | incoming | result |
//! |---|---|---|
//! | none | any | incoming |
//! | any | `Set(v)` / `Delete` | incoming |
//! | `Set(v)` / `Delete` | any other | `Set` of incoming applied to `v` (or to nothing) |
//! | `Increment(a)` | `Increment(b)` | `Increment(a + b)` |
//! | `Add(e1)` | `Add(e2)` | `Add(e1 ++ e2)` |
//! | `Add(e1)` | `Remove(e2)` | `Add(e1 - e2)`, cleared when empty |
//! | `AddUnique(e1)` | `AddUnique(e2)` | `AddUnique(e1 ∪ e2)` |
//! | `AddUnique(e1)` | `Remove(e2)` | `AddUnique(e1 - e2)` |
//! | `Remove(e1)` | `Remove(e2)` | `Remove(e1 ∪ e2)` |
//!
//! Every other pair fails with [`OperationError::IncompatibleOperation`].

use super::{Operation, OperationError};
use crate::value::{Value, list};

/// Reduces `incoming` against the `pending` operation for `key`.
///
/// Returns `Ok(None)` when the pair cancels out and the key no longer needs
/// synchronizing. On error nothing has been consumed from `pending`; the
/// caller keeps it as the key's entry.
pub fn reduce(
    key: &str,
    pending: Option<&Operation>,
    incoming: Operation,
) -> Result<Option<Operation>, OperationError> {
    let Some(pending) = pending else {
        return Ok(Some(incoming));
    };
    let pending_kind = pending.kind();
    let incoming_kind = incoming.kind();

    let reduced = match pending {
        Operation::Set(base) => reduce_replacement(key, pending, Some(base), incoming)?,
        Operation::Delete => reduce_replacement(key, pending, None, incoming)?,
        Operation::Increment(_) => reduce_numeric(key, pending, incoming)?,
        Operation::Add(_) | Operation::AddUnique(_) | Operation::Remove(_) => {
            reduce_list(key, pending, incoming)?
        }
    };

    tracing::debug!(
        key,
        pending = %pending_kind,
        incoming = %incoming_kind,
        result = reduced.as_ref().map_or("none", |op| op.kind().wire_name()),
        "Reduced operation"
    );
    Ok(reduced)
}

/// The pending operation fixed the whole value (`Set`) or its absence
/// (`Delete`), so the incoming operation can be folded into a new replacement.
fn reduce_replacement(
    key: &str,
    pending: &Operation,
    base: Option<&Value>,
    incoming: Operation,
) -> Result<Option<Operation>, OperationError> {
    if matches!(incoming, Operation::Set(_) | Operation::Delete) {
        return Ok(Some(incoming));
    }
    match incoming.apply(base) {
        Ok(Some(value)) => Ok(Some(Operation::Set(value))),
        Ok(None) => Ok(Some(Operation::Delete)),
        Err(_) => Err(incompatible(key, pending, &incoming)),
    }
}

fn reduce_numeric(
    key: &str,
    pending: &Operation,
    incoming: Operation,
) -> Result<Option<Operation>, OperationError> {
    match (pending, incoming) {
        (Operation::Increment(a), Operation::Increment(b)) => {
            Ok(Some(Operation::Increment(*a + b)))
        }
        (_, incoming @ (Operation::Set(_) | Operation::Delete)) => Ok(Some(incoming)),
        (pending, incoming) => Err(incompatible(key, pending, &incoming)),
    }
}

fn reduce_list(
    key: &str,
    pending: &Operation,
    incoming: Operation,
) -> Result<Option<Operation>, OperationError> {
    match (pending, incoming) {
        (_, incoming @ (Operation::Set(_) | Operation::Delete)) => Ok(Some(incoming)),
        (Operation::Add(pending), Operation::Add(mut added)) => {
            let mut objects = pending.clone();
            objects.append(&mut added);
            Ok(Some(Operation::Add(objects)))
        }
        (Operation::Add(pending), Operation::Remove(removed)) => {
            let remaining = list::difference(pending, &removed);
            if remaining.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Operation::Add(remaining)))
            }
        }
        (Operation::AddUnique(pending), Operation::AddUnique(added)) => {
            Ok(Some(Operation::AddUnique(list::union(pending, &added))))
        }
        (Operation::AddUnique(pending), Operation::Remove(removed)) => Ok(Some(
            Operation::AddUnique(list::difference(pending, &removed)),
        )),
        (Operation::Remove(pending), Operation::Remove(removed)) => {
            Ok(Some(Operation::Remove(list::union(pending, &removed))))
        }
        (pending, incoming) => Err(incompatible(key, pending, &incoming)),
    }
}

fn incompatible(key: &str, pending: &Operation, incoming: &Operation) -> OperationError {
    OperationError::IncompatibleOperation {
        key: key.to_string(),
        pending: pending.kind(),
        incoming: incoming.kind(),
    }
}
