//! Ordered list values.
//!
//! A [`List`] holds an ordered sequence of [`Value`]s. Every mutation
//! recomputes the materialized contents and then reports a raw operation to
//! the owning record through the list's [`ParentLink`], if it has one.

use std::slice;

use super::{Value, ValueError, link::ParentLink};
use crate::{Result, operation::Operation};

/// Ordered sequence of values tracked for synchronization.
///
/// The contents are either absent (never materialized, for example an
/// attribute that was never fetched) or a concrete sequence. Element order is
/// insertion order and is significant.
///
/// # Mutation
///
/// ```
/// # use nimbus::value::List;
/// let mut list = List::new();
/// list.append("a").unwrap();
/// list.append_unique("a").unwrap(); // already present, contents unchanged
/// list.append("b").unwrap();
/// list.remove("a").unwrap();
///
/// assert_eq!(list.len(), 1);
/// assert!(list.contains(&"b".into()));
/// ```
///
/// # Copies
///
/// Cloning a list produces a detached copy: the same contents, but no link to
/// the record the original belongs to. Mutating the copy never produces
/// pending operations.
#[derive(Debug)]
pub struct List {
    contents: Option<Vec<Value>>,
    parent: Option<ParentLink>,
}

impl List {
    /// Creates a new, materialized, empty list
    pub fn new() -> Self {
        Self {
            contents: Some(Vec::new()),
            parent: None,
        }
    }

    /// Creates a list whose contents were never materialized
    pub fn unmaterialized() -> Self {
        Self {
            contents: None,
            parent: None,
        }
    }

    /// Returns the contents, or `None` if the list was never materialized
    pub fn contents(&self) -> Option<&[Value]> {
        self.contents.as_deref()
    }

    /// Returns true if the list holds concrete contents
    pub fn is_materialized(&self) -> bool {
        self.contents.is_some()
    }

    /// Returns the number of elements (zero when unmaterialized)
    pub fn len(&self) -> usize {
        self.contents.as_ref().map_or(0, Vec::len)
    }

    /// Returns true if the list has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets an element by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.contents.as_ref().and_then(|c| c.get(index))
    }

    /// Returns true if an element equal to `value` is present
    pub fn contains(&self, value: &Value) -> bool {
        self.contents.as_ref().is_some_and(|c| c.contains(value))
    }

    /// Iterates over the elements in order
    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.contents.as_deref().unwrap_or_default().iter()
    }

    /// Consumes the list and returns its contents
    pub fn into_contents(self) -> Option<Vec<Value>> {
        self.contents
    }

    /// The key this list is registered under, if it is attached to a record
    pub fn parent_key(&self) -> Option<&str> {
        self.parent.as_ref().map(ParentLink::key)
    }

    pub(crate) fn attach(&mut self, link: ParentLink) {
        self.parent = Some(link);
    }

    pub(crate) fn detach(&mut self) -> Option<ParentLink> {
        self.parent.take()
    }

    /// Appends `element` to the end of the list.
    ///
    /// Unmaterialized contents are treated as empty. The owner is notified with
    /// an `Add` operation carrying `[element]`.
    pub fn append(&mut self, element: impl Into<Value>) -> Result<()> {
        let element = element.into();
        let next = self.concatenate(Some(slice::from_ref(&element)), false);
        self.commit(next, Operation::Add(vec![element]))
    }

    /// Appends `element` only if no equal element is already present.
    ///
    /// The owner is notified with an `AddUnique` operation even when the
    /// element was already present locally: the remote store performs its own
    /// uniqueness check against its copy.
    pub fn append_unique(&mut self, element: impl Into<Value>) -> Result<()> {
        let element = element.into();
        let mut next = self.contents.clone().unwrap_or_default();
        append_missing(&mut next, slice::from_ref(&element));
        self.commit(Some(next), Operation::AddUnique(vec![element]))
    }

    /// Appends `element`, optionally only when it is not already present.
    pub fn append_with(&mut self, element: impl Into<Value>, unique: bool) -> Result<()> {
        if unique {
            self.append_unique(element)
        } else {
            self.append(element)
        }
    }

    /// Removes every element equal to `element`.
    ///
    /// The owner is notified with a `Remove` operation carrying `[element]`.
    pub fn remove(&mut self, element: impl Into<Value>) -> Result<()> {
        let element = element.into();
        let next = self.subtract(Some(slice::from_ref(&element)));
        self.commit(next, Operation::Remove(vec![element]))
    }

    /// Returns the contents followed by the elements of `other`.
    ///
    /// Absent `other` leaves the contents unchanged (absent included). Absent
    /// contents are treated as empty. With `unique`, the result holds no two
    /// equal elements; the first occurrence wins.
    pub fn concatenate(&self, other: Option<&[Value]>, unique: bool) -> Option<Vec<Value>> {
        let Some(other) = other else {
            return self.contents.clone();
        };
        let base = self.contents.as_deref().unwrap_or_default();
        if unique {
            Some(union(base, other))
        } else {
            Some(base.iter().chain(other).cloned().collect())
        }
    }

    /// Returns the contents without every element equal to one in `other`.
    ///
    /// Absent contents stay absent. Absent `other` returns the contents.
    pub fn subtract(&self, other: Option<&[Value]>) -> Option<Vec<Value>> {
        let contents = self.contents.as_ref()?;
        match other {
            Some(other) => Some(difference(contents, other)),
            None => Some(contents.clone()),
        }
    }

    /// `self + other` over two lists, returning a new detached list.
    ///
    /// Fails with [`ValueError::TypeMismatch`] unless `other` is a list.
    pub fn plus(&self, other: &Value, unique: bool) -> std::result::Result<List, ValueError> {
        match other {
            Value::List(other) => Ok(List {
                contents: self.concatenate(other.contents(), unique),
                parent: None,
            }),
            other => Err(ValueError::mismatch("list", other)),
        }
    }

    /// `self - other` over two lists, returning a new detached list.
    ///
    /// Fails with [`ValueError::TypeMismatch`] unless `other` is a list.
    pub fn minus(&self, other: &Value) -> std::result::Result<List, ValueError> {
        match other {
            Value::List(other) => Ok(List {
                contents: self.subtract(other.contents()),
                parent: None,
            }),
            other => Err(ValueError::mismatch("list", other)),
        }
    }

    /// Installs `next` as the contents and notifies the owner.
    ///
    /// The previous contents are restored if the owner rejects the operation.
    fn commit(&mut self, next: Option<Vec<Value>>, operation: Operation) -> Result<()> {
        let previous = std::mem::replace(&mut self.contents, next);
        tracing::trace!(
            key = self.parent_key().unwrap_or("<detached>"),
            kind = %operation.kind(),
            len = self.len(),
            "List mutated"
        );

        if let Some(parent) = &self.parent
            && let Err(err) = parent.notify(operation)
        {
            self.contents = previous;
            return Err(err);
        }
        Ok(())
    }
}

/// `base` followed by `extra`, keeping only the first of any equal elements.
pub(crate) fn union(base: &[Value], extra: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(base.len() + extra.len());
    append_missing(&mut out, base);
    append_missing(&mut out, extra);
    out
}

/// Pushes each element of `extra` that is not already in `base`.
///
/// Duplicates already present in `base` are left alone.
pub(crate) fn append_missing(base: &mut Vec<Value>, extra: &[Value]) {
    for value in extra {
        if !base.contains(value) {
            base.push(value.clone());
        }
    }
}

/// `base` without every element equal to one in `remove`.
pub(crate) fn difference(base: &[Value], remove: &[Value]) -> Vec<Value> {
    base.iter()
        .filter(|value| !remove.contains(value))
        .cloned()
        .collect()
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for List {
    fn clone(&self) -> Self {
        Self {
            contents: self.contents.clone(),
            parent: None,
        }
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.contents == other.contents
    }
}

impl From<Vec<Value>> for List {
    fn from(contents: Vec<Value>) -> Self {
        Self {
            contents: Some(contents),
            parent: None,
        }
    }
}

impl FromIterator<Value> for List {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        List::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
