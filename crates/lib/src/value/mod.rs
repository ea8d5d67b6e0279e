//! The value model stored under record attributes.
//!
//! Values are either atomic (null, booleans, numbers, strings, dates, raw
//! bytes), containers (lists, dictionaries, counters) whose mutations are
//! tracked as operations, or references to data stored elsewhere (other
//! records, relations, uploaded files).
//!
//! # Core Types
//!
//! - [`Value`] - The tagged union of every storable value
//! - [`List`] - Ordered sequence supporting append, unique-append and remove
//! - [`Dictionary`] - String-keyed map, synchronized as a whole
//! - [`Counter`] - Number synchronized through atomic increments
//! - [`ParentLink`] / [`MutationSink`] - Weak upward notification to the owning record

use std::fmt;

use chrono::{DateTime, Utc};

pub mod counter;
pub mod dictionary;
pub mod errors;
pub mod link;
pub mod list;
pub mod number;
pub mod reference;

pub use counter::Counter;
pub use dictionary::Dictionary;
pub use errors::ValueError;
pub use link::{MutationSink, ParentLink};
pub use list::List;
pub use number::Number;
pub use reference::{FileRef, Reference, Relation};

/// Values that can be stored under a record attribute.
///
/// Equality is structural: two values are equal when they are the same variant
/// with equal contents. Container values compare by contents only; the link to
/// an owning record never takes part. Cloning a value yields a detached copy.
///
/// ```
/// # use nimbus::value::{List, Value};
/// let text = Value::from("hello");
/// assert!(text == "hello");
/// assert!(Value::from(42) == 42);
/// assert_ne!(Value::from("42"), Value::from(42));
///
/// let list = Value::List(List::from(vec!["a".into()]));
/// assert_eq!(list.clone(), list);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Atomic values
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer or floating point number
    Number(Number),
    /// UTF-8 string
    String(String),
    /// Point in time
    Date(DateTime<Utc>),
    /// Raw bytes
    Bytes(Vec<u8>),

    // Containers
    /// Ordered sequence of values
    List(List),
    /// String-keyed map of values
    Dictionary(Dictionary),
    /// Number synchronized through increments
    Counter(Counter),

    // References
    /// Pointer to another record
    Reference(Reference),
    /// Relation to a class of records
    Relation(Relation),
    /// Uploaded binary asset
    File(FileRef),
}

impl Value {
    /// Returns true for values without inner structure
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::Date(_)
                | Value::Bytes(_)
        )
    }

    /// Returns true for values whose mutations are tracked as operations
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Dictionary(_) | Value::Counter(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Dictionary(_) => "dictionary",
            Value::Counter(_) => "counter",
            Value::Reference(_) => "reference",
            Value::Relation(_) => "relation",
            Value::File(_) => "file",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric value of numbers and counters
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Counter(c) => c.value(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_counter_mut(&mut self) -> Option<&mut Counter> {
        match self {
            Value::Counter(counter) => Some(counter),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Binary addition dispatched on the variants of both operands.
    ///
    /// Defined for list + list, number + number and counter + number.
    /// Every other pairing is a [`ValueError::TypeMismatch`]; nothing is
    /// coerced.
    pub fn plus(&self, other: &Value, unique: bool) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::List(list), other) => list.plus(other, unique).map(Value::List),
            (Value::Counter(counter), other) => counter.plus(other).map(Value::Counter),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(*a + *b)),
            (Value::Number(_), other) => Err(ValueError::mismatch("number", other)),
            (this, _) => Err(ValueError::mismatch("list or number", this)),
        }
    }

    /// Binary subtraction dispatched on the variants of both operands.
    ///
    /// Defined for list - list, number - number and counter - number.
    pub fn minus(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::List(list), other) => list.minus(other).map(Value::List),
            (Value::Counter(counter), other) => counter.minus(other).map(Value::Counter),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(*a - *b)),
            (Value::Number(_), other) => Err(ValueError::mismatch("number", other)),
            (this, _) => Err(ValueError::mismatch("list or number", this)),
        }
    }

    /// Fails if a dictionary anywhere inside this value uses a wire tag
    /// (`__op` or `__type`) as a key.
    pub fn check_wire_keys(&self) -> Result<(), ValueError> {
        match self {
            Value::List(list) => list.iter().try_for_each(Value::check_wire_keys),
            Value::Dictionary(dict) => dict.iter().try_for_each(|(key, value)| {
                dictionary::check_key(key)?;
                value.check_wire_keys()
            }),
            _ => Ok(()),
        }
    }

    /// Registers a container value with its owner. Atomic values ignore the link.
    pub(crate) fn attach(&mut self, link: ParentLink) {
        match self {
            Value::List(list) => list.attach(link),
            Value::Dictionary(dict) => dict.attach(link),
            Value::Counter(counter) => counter.attach(link),
            _ => {}
        }
    }

    /// Clears the owner registration of a container value.
    pub(crate) fn detach(&mut self) {
        match self {
            Value::List(list) => {
                list.detach();
            }
            Value::Dictionary(dict) => {
                dict.detach();
            }
            Value::Counter(counter) => {
                counter.detach();
            }
            _ => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(list) => {
                if !list.is_materialized() {
                    return write!(f, "<unmaterialized>");
                }
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Dictionary(dict) => {
                write!(f, "{{")?;
                for (i, (key, item)) in dict.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "}}")
            }
            Value::Counter(c) => write!(f, "{}", c.value_or_zero()),
            Value::Reference(r) => write!(f, "{r}"),
            Value::Relation(r) => write!(f, "<relation {}>", r.target_class),
            Value::File(file) => write!(f, "<file {}>", file.name),
        }
    }
}

// Convenient From implementations for common types
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Int(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Int(value as i64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Value::List(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Value::Dictionary(value)
    }
}

impl From<Counter> for Value {
    fn from(value: Counter) -> Self {
        Value::Counter(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Value::Reference(value)
    }
}

impl From<Relation> for Value {
    fn from(value: Relation) -> Self {
        Value::Relation(value)
    }
}

impl From<FileRef> for Value {
    fn from(value: FileRef) -> Self {
        Value::File(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<&Value> for String {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(ValueError::mismatch("string", value)),
        }
    }
}

impl TryFrom<&Value> for i64 {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value.as_number() {
            Some(Number::Int(n)) => Ok(n),
            _ => Err(ValueError::mismatch("integer", value)),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(ValueError::mismatch("bool", value)),
        }
    }
}

impl TryFrom<&Value> for List {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(list) => Ok(list.clone()),
            _ => Err(ValueError::mismatch("list", value)),
        }
    }
}

// PartialEq implementations for comparing Value with primitives
impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Value::Number(n) if *n == Number::Int(*other))
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        self == &(*other as i64)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}
