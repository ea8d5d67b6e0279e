//! Wire format integration tests

use chrono::{TimeZone, Utc};
use nimbus::{
    Operation, Value,
    codec::{CodecError, decode_operation, decode_value, encode_operation, encode_value},
    value::{Dictionary, FileRef, List, Number, Reference, Relation},
};
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_list_operations_encode_with_objects() {
    assert_eq!(
        encode_operation(&add_unique(&["a", "b"])),
        json!({"__op": "AddUnique", "objects": ["a", "b"]})
    );
    assert_eq!(
        encode_operation(&remove(&["a"])),
        json!({"__op": "Remove", "objects": ["a"]})
    );
    assert_eq!(encode_operation(&Operation::Delete), json!({"__op": "Delete"}));
    assert_eq!(
        encode_operation(&Operation::Increment(Number::Float(1.5))),
        json!({"__op": "Increment", "amount": 1.5})
    );
}

#[test]
fn test_typed_values_encode_with_type_tag() {
    assert_eq!(
        encode_value(&Value::from(Reference::new("Post", "abc"))),
        json!({"__type": "Pointer", "className": "Post", "objectId": "abc"})
    );
    assert_eq!(
        encode_value(&Value::from(Relation::new("Comment"))),
        json!({"__type": "Relation", "className": "Comment"})
    );
    assert_eq!(
        encode_value(&Value::from(FileRef::new("cover.png"))),
        json!({"__type": "File", "name": "cover.png"})
    );
    assert_eq!(
        encode_value(&Value::Bytes(vec![0, 1, 2])),
        json!({"__type": "Bytes", "base64": "AAEC"})
    );
}

#[test]
fn test_nested_containers_decode() {
    let decoded = decode_value(&json!({
        "tags": ["a", 1, null],
        "published": {"__type": "Date", "iso": "2024-05-01T12:00:00.000Z"},
    }))
    .unwrap();

    let Value::Dictionary(dict) = decoded else {
        panic!("expected a dictionary");
    };
    assert_eq!(
        dict.get("tags"),
        Some(&Value::List(List::from(vec![
            "a".into(),
            1.into(),
            Value::Null
        ])))
    );
    assert_eq!(
        dict.get("published"),
        Some(&Value::Date(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
    );
}

#[test]
fn test_value_serde_goes_through_wire_format() {
    let dict: Dictionary = [("n", 1)].into_iter().collect();
    let value = Value::Dictionary(dict);
    let text = serde_json::to_string(&value).unwrap();
    assert_eq!(text, r#"{"n":1}"#);

    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, value);

    let operation: Operation = serde_json::from_str(r#"{"__op":"Add","objects":["x"]}"#).unwrap();
    assert_eq!(operation, add(&["x"]));
}

#[test]
fn test_malformed_wire_data() {
    let err = decode_value(&json!({"__type": "Pointer", "className": "Post"})).unwrap_err();
    assert!(matches!(err, CodecError::MissingField { field: "objectId", .. }));

    let err = decode_value(&json!({"__type": "Date", "iso": "yesterday"})).unwrap_err();
    assert!(matches!(err, CodecError::InvalidField { .. }));

    let err = decode_operation(&json!({"__op": "Remove", "objects": "a"})).unwrap_err();
    assert!(matches!(err, CodecError::InvalidField { .. }));

    let err = serde_json::from_str::<Value>(r#"{"__type":"Polygon"}"#).unwrap_err();
    assert!(err.to_string().contains("Polygon"));
}
