//! Operations: immutable descriptions of a single mutation of a record
//! attribute, as exchanged with the remote store's update protocol.
//!
//! An [`Operation`] carries its operand by construction, so kind and operand
//! shape can never disagree: the Add family always carries a list of
//! elements, `Increment` always carries a number. The attribute key travels
//! alongside the operation rather than inside it.
//!
//! [`reduce`] merges a pending operation with a newly issued one;
//! [`Operation::apply`] executes an operation against a stored value the way
//! the remote store does.

use std::fmt;

use crate::value::{List, Number, Value, ValueError, list};

pub mod errors;
pub mod reduce;

pub use errors::OperationError;
pub use reduce::reduce;

/// The kind of an [`Operation`], without its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Set,
    Delete,
    Increment,
    Add,
    AddUnique,
    Remove,
}

impl OperationKind {
    /// The name used for this kind on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            OperationKind::Set => "Set",
            OperationKind::Delete => "Delete",
            OperationKind::Increment => "Increment",
            OperationKind::Add => "Add",
            OperationKind::AddUnique => "AddUnique",
            OperationKind::Remove => "Remove",
        }
    }

    /// Returns true for the operations that act on list elements
    pub fn is_list_operation(&self) -> bool {
        matches!(
            self,
            OperationKind::Add | OperationKind::AddUnique | OperationKind::Remove
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A single mutation of one record attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Replace the attribute with a value
    Set(Value),
    /// Remove the attribute
    Delete,
    /// Add a number to the attribute
    Increment(Number),
    /// Append elements to a list attribute
    Add(Vec<Value>),
    /// Append elements not already present in a list attribute
    AddUnique(Vec<Value>),
    /// Remove every occurrence of the elements from a list attribute
    Remove(Vec<Value>),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Set(_) => OperationKind::Set,
            Operation::Delete => OperationKind::Delete,
            Operation::Increment(_) => OperationKind::Increment,
            Operation::Add(_) => OperationKind::Add,
            Operation::AddUnique(_) => OperationKind::AddUnique,
            Operation::Remove(_) => OperationKind::Remove,
        }
    }

    /// Fails if a value carried by this operation holds a dictionary keyed by
    /// a wire tag.
    pub fn check_wire_keys(&self) -> Result<(), ValueError> {
        match self {
            Operation::Set(value) => value.check_wire_keys(),
            Operation::Add(objects) | Operation::AddUnique(objects) | Operation::Remove(objects) => {
                objects.iter().try_for_each(Value::check_wire_keys)
            }
            Operation::Delete | Operation::Increment(_) => Ok(()),
        }
    }

    /// The operand as a value: the replacement, the amount, or the elements
    /// as a list. `Delete` has a null operand.
    pub fn operand(&self) -> Value {
        match self {
            Operation::Set(value) => value.clone(),
            Operation::Delete => Value::Null,
            Operation::Increment(amount) => Value::Number(*amount),
            Operation::Add(objects) | Operation::AddUnique(objects) | Operation::Remove(objects) => {
                Value::List(List::from(objects.clone()))
            }
        }
    }

    /// The list elements carried by an Add-family operation
    pub fn objects(&self) -> Option<&[Value]> {
        match self {
            Operation::Add(objects) | Operation::AddUnique(objects) | Operation::Remove(objects) => {
                Some(objects)
            }
            _ => None,
        }
    }

    /// Applies the operation to the stored value `current` the way the remote
    /// store does, returning the new stored value (`None` = attribute absent).
    ///
    /// Absent values count as an empty list for the Add family and as zero for
    /// `Increment`. Removing from an absent attribute leaves it absent.
    pub fn apply(&self, current: Option<&Value>) -> Result<Option<Value>, OperationError> {
        match self {
            Operation::Set(value) => Ok(Some(value.clone())),
            Operation::Delete => Ok(None),
            Operation::Increment(amount) => {
                let base = match current {
                    None | Some(Value::Null) => Number::ZERO,
                    Some(Value::Number(n)) => *n,
                    Some(Value::Counter(c)) => c.value_or_zero(),
                    Some(other) => return Err(self.invalid_target(other)),
                };
                Ok(Some(Value::Number(base + *amount)))
            }
            Operation::Add(objects) => {
                let mut elements = self.current_elements(current)?.unwrap_or_default();
                elements.extend(objects.iter().cloned());
                Ok(Some(Value::List(List::from(elements))))
            }
            Operation::AddUnique(objects) => {
                let mut elements = self.current_elements(current)?.unwrap_or_default();
                list::append_missing(&mut elements, objects);
                Ok(Some(Value::List(List::from(elements))))
            }
            Operation::Remove(objects) => Ok(self
                .current_elements(current)?
                .map(|elements| Value::List(List::from(list::difference(&elements, objects))))),
        }
    }

    fn current_elements(&self, current: Option<&Value>) -> Result<Option<Vec<Value>>, OperationError> {
        match current {
            None | Some(Value::Null) => Ok(None),
            Some(Value::List(list)) => Ok(list.contents().map(<[Value]>::to_vec)),
            Some(other) => Err(self.invalid_target(other)),
        }
    }

    fn invalid_target(&self, actual: &Value) -> OperationError {
        OperationError::InvalidTarget {
            operation: self.kind(),
            actual: actual.type_name(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Delete => write!(f, "Delete"),
            other => write!(f, "{}({})", other.kind(), other.operand()),
        }
    }
}
