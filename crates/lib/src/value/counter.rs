//! Numeric counters that synchronize as atomic increments.

use super::{Number, Value, ValueError, link::ParentLink};
use crate::{Result, operation::Operation};

/// A number that reports its changes as `Increment` operations rather than
/// as replacements, so concurrent increments from other clients are not lost.
#[derive(Debug)]
pub struct Counter {
    value: Option<Number>,
    parent: Option<ParentLink>,
}

impl Counter {
    /// Creates a counter with no known value
    pub fn new() -> Self {
        Self {
            value: None,
            parent: None,
        }
    }

    /// The current value, if known
    pub fn value(&self) -> Option<Number> {
        self.value
    }

    /// The current value, treating an unknown value as zero
    pub fn value_or_zero(&self) -> Number {
        self.value.unwrap_or_default()
    }

    pub(crate) fn attach(&mut self, link: ParentLink) {
        self.parent = Some(link);
    }

    pub(crate) fn detach(&mut self) -> Option<ParentLink> {
        self.parent.take()
    }

    /// Adds `amount` to the counter and notifies the owner with an
    /// `Increment(amount)` operation.
    pub fn increment(&mut self, amount: impl Into<Number>) -> Result<()> {
        let amount = amount.into();
        let previous = self.value.replace(self.value_or_zero() + amount);

        if let Some(parent) = &self.parent {
            tracing::trace!(key = parent.key(), %amount, "Counter incremented");
            if let Err(err) = parent.notify(Operation::Increment(amount)) {
                self.value = previous;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Subtracts `amount`; reported as a negative increment.
    pub fn decrement(&mut self, amount: impl Into<Number>) -> Result<()> {
        self.increment(-amount.into())
    }

    /// `self + other` where `other` is a number or another counter.
    pub fn plus(&self, other: &Value) -> std::result::Result<Counter, ValueError> {
        let amount = match other {
            Value::Number(n) => *n,
            Value::Counter(c) => c.value_or_zero(),
            other => return Err(ValueError::mismatch("number", other)),
        };
        Ok(Counter::from(self.value_or_zero() + amount))
    }

    /// `self - other` where `other` is a number or another counter.
    pub fn minus(&self, other: &Value) -> std::result::Result<Counter, ValueError> {
        let amount = match other {
            Value::Number(n) => *n,
            Value::Counter(c) => c.value_or_zero(),
            other => return Err(ValueError::mismatch("number", other)),
        };
        Ok(Counter::from(self.value_or_zero() - amount))
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        Self {
            value: self.value,
            parent: None,
        }
    }
}

impl PartialEq for Counter {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<Number> for Counter {
    fn from(value: Number) -> Self {
        Self {
            value: Some(value),
            parent: None,
        }
    }
}

impl From<i64> for Counter {
    fn from(value: i64) -> Self {
        Counter::from(Number::Int(value))
    }
}
