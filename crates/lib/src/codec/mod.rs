//! JSON wire format shared with the remote store.
//!
//! Plain JSON types map onto the matching [`Value`] variants. Values JSON has
//! no type for travel as objects tagged with `__type`:
//!
//! ```json
//! {"__type": "Date", "iso": "2024-05-01T12:00:00.000Z"}
//! {"__type": "Bytes", "base64": "AAEC"}
//! {"__type": "Pointer", "className": "Post", "objectId": "k3Jd9aQe1Z"}
//! {"__type": "Relation", "className": "Comment"}
//! {"__type": "File", "name": "cover.png", "url": "https://..."}
//! ```
//!
//! Operations other than `Set` are objects tagged with `__op`; a `Set` is sent
//! as the bare value.
//!
//! ```json
//! {"__op": "Delete"}
//! {"__op": "Increment", "amount": 2}
//! {"__op": "AddUnique", "objects": ["a", "b"]}
//! ```
//!
//! Counters encode as their current number, and a list that was never
//! materialized encodes as `null`.

use base64ct::{Base64, Encoding};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value as JsonValue, json};

use crate::{
    constants::{OP, TYPE},
    operation::{Operation, OperationKind},
    value::{Dictionary, FileRef, List, Number, Reference, Relation, Value},
};

pub mod errors;

pub use errors::CodecError;

/// Encodes a value into its wire representation.
pub fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => encode_number(*n),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Date(date) => json!({ TYPE: "Date", "iso": encode_timestamp(date) }),
        Value::Bytes(bytes) => json!({ TYPE: "Bytes", "base64": Base64::encode_string(bytes) }),
        Value::List(list) => match list.contents() {
            Some(elements) => JsonValue::Array(elements.iter().map(encode_value).collect()),
            None => JsonValue::Null,
        },
        Value::Dictionary(dict) => match dict.contents() {
            Some(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), encode_value(v)))
                    .collect(),
            ),
            None => JsonValue::Null,
        },
        Value::Counter(counter) => encode_number(counter.value_or_zero()),
        Value::Reference(reference) => json!({
            TYPE: "Pointer",
            "className": reference.class_name,
            "objectId": reference.object_id,
        }),
        Value::Relation(relation) => json!({ TYPE: "Relation", "className": relation.target_class }),
        Value::File(file) => {
            let mut object = Map::new();
            object.insert(TYPE.to_string(), "File".into());
            object.insert("name".to_string(), file.name.clone().into());
            if let Some(url) = &file.url {
                object.insert("url".to_string(), url.clone().into());
            }
            JsonValue::Object(object)
        }
    }
}

/// Decodes a value from its wire representation.
///
/// JSON arrays decode as materialized lists and untagged objects as
/// dictionaries. Neither is linked to a record.
pub fn decode_value(json: &JsonValue) -> Result<Value, CodecError> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => decode_number("number", n).map(Value::Number),
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        JsonValue::Array(elements) => elements
            .iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(|elements| Value::List(List::from(elements))),
        JsonValue::Object(object) => {
            if let Some(tag) = object.get(TYPE) {
                return decode_typed(tag, object);
            }
            if object.contains_key(OP) {
                return Err(CodecError::invalid(
                    OP,
                    "operation found where a value was expected",
                ));
            }
            object
                .iter()
                .map(|(k, v)| decode_value(v).map(|v| (k.clone(), v)))
                .collect::<Result<std::collections::BTreeMap<_, _>, _>>()
                .map(|entries| Value::Dictionary(Dictionary::from(entries)))
        }
    }
}

fn decode_typed(tag: &JsonValue, object: &Map<String, JsonValue>) -> Result<Value, CodecError> {
    let type_name = tag
        .as_str()
        .ok_or_else(|| CodecError::invalid(TYPE, "expected a string"))?;
    match type_name {
        "Date" => {
            let iso = required_str(object, type_name, "iso")?;
            parse_timestamp("iso", iso).map(Value::Date)
        }
        "Bytes" => {
            let encoded = required_str(object, type_name, "base64")?;
            Base64::decode_vec(encoded)
                .map(Value::Bytes)
                .map_err(|err| CodecError::invalid("base64", err.to_string()))
        }
        "Pointer" => Ok(Value::Reference(Reference::new(
            required_str(object, type_name, "className")?,
            required_str(object, type_name, "objectId")?,
        ))),
        "Relation" => Ok(Value::Relation(Relation::new(required_str(
            object,
            type_name,
            "className",
        )?))),
        "File" => {
            let file = FileRef::new(required_str(object, type_name, "name")?);
            Ok(Value::File(match object.get("url").and_then(JsonValue::as_str) {
                Some(url) => file.with_url(url),
                None => file,
            }))
        }
        other => Err(CodecError::UnknownType {
            type_name: other.to_string(),
        }),
    }
}

/// Encodes an operation into its wire representation.
pub fn encode_operation(operation: &Operation) -> JsonValue {
    match operation {
        Operation::Set(value) => encode_value(value),
        Operation::Delete => json!({ OP: "Delete" }),
        Operation::Increment(amount) => json!({ OP: "Increment", "amount": encode_number(*amount) }),
        Operation::Add(objects) | Operation::AddUnique(objects) | Operation::Remove(objects) => {
            json!({
                OP: operation.kind().wire_name(),
                "objects": objects.iter().map(encode_value).collect::<Vec<_>>(),
            })
        }
    }
}

/// Decodes an operation from its wire representation.
///
/// Anything that is not an `__op` object decodes as a `Set` of that value.
pub fn decode_operation(json: &JsonValue) -> Result<Operation, CodecError> {
    let Some(object) = json.as_object().filter(|o| o.contains_key(OP)) else {
        return decode_value(json).map(Operation::Set);
    };
    let name = object
        .get(OP)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| CodecError::invalid(OP, "expected a string"))?;

    let kind = match name {
        "Delete" => return Ok(Operation::Delete),
        "Increment" => {
            let amount = object.get("amount").ok_or_else(|| CodecError::MissingField {
                context: name.to_string(),
                field: "amount",
            })?;
            let amount = amount
                .as_number()
                .ok_or_else(|| CodecError::invalid("amount", "expected a number"))?;
            return decode_number("amount", amount).map(Operation::Increment);
        }
        "Add" => OperationKind::Add,
        "AddUnique" => OperationKind::AddUnique,
        "Remove" => OperationKind::Remove,
        other => {
            return Err(CodecError::UnknownOperation {
                name: other.to_string(),
            });
        }
    };

    let objects = object
        .get("objects")
        .ok_or_else(|| CodecError::MissingField {
            context: name.to_string(),
            field: "objects",
        })?
        .as_array()
        .ok_or_else(|| CodecError::invalid("objects", "expected an array"))?
        .iter()
        .map(decode_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match kind {
        OperationKind::Add => Operation::Add(objects),
        OperationKind::AddUnique => Operation::AddUnique(objects),
        _ => Operation::Remove(objects),
    })
}

/// Formats a timestamp the way the remote store does: RFC 3339 in UTC with
/// millisecond precision.
pub fn encode_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decodes a metadata timestamp, given either as a bare string or as a
/// tagged `Date` object.
pub fn decode_timestamp(field: &str, json: &JsonValue) -> Result<DateTime<Utc>, CodecError> {
    match json {
        JsonValue::String(s) => parse_timestamp(field, s),
        JsonValue::Object(_) => match decode_value(json)? {
            Value::Date(date) => Ok(date),
            other => Err(CodecError::invalid(
                field,
                format!("expected a date, found {}", other.type_name()),
            )),
        },
        _ => Err(CodecError::invalid(field, "expected a timestamp")),
    }
}

/// Decodes a field that must be a string.
pub fn decode_string(field: &str, json: &JsonValue) -> Result<String, CodecError> {
    json.as_str()
        .map(str::to_string)
        .ok_or_else(|| CodecError::invalid(field, "expected a string"))
}

fn encode_number(n: Number) -> JsonValue {
    match n {
        Number::Int(i) => JsonValue::from(i),
        // Non-finite floats have no JSON form and become null
        Number::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
    }
}

fn decode_number(field: &str, n: &serde_json::Number) -> Result<Number, CodecError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::Int(i));
    }
    n.as_f64()
        .map(Number::Float)
        .ok_or_else(|| CodecError::invalid(field, format!("unrepresentable number {n}")))
}

fn parse_timestamp(field: &str, s: &str) -> Result<DateTime<Utc>, CodecError> {
    DateTime::parse_from_rfc3339(s)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| CodecError::invalid(field, err.to_string()))
}

fn required_str<'a>(
    object: &'a Map<String, JsonValue>,
    context: &str,
    field: &'static str,
) -> Result<&'a str, CodecError> {
    match object.get(field) {
        Some(JsonValue::String(s)) => Ok(s),
        Some(_) => Err(CodecError::invalid(field, "expected a string")),
        None => Err(CodecError::MissingField {
            context: context.to_string(),
            field,
        }),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        decode_value(&json).map_err(de::Error::custom)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_operation(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        decode_operation(&json).map_err(de::Error::custom)
    }
}
