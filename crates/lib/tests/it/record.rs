//! Record integration tests
//!
//! Covers the binding between a record and its containers: every container
//! mutation updates the pending operation for its key synchronously, failed
//! mutations change neither contents nor pending operations, and flushing
//! clears exactly what was transmitted.

use nimbus::{
    Error, Operation, Record, Value,
    record::RecordError,
    value::{Dictionary, List, Number},
};
use serde_json::json;

use crate::helpers::*;

// ===== LIST BINDING =====

#[test]
fn test_append_updates_contents_and_pending() {
    let mut record = Record::new("Post");
    record.list_mut("tags").unwrap().append("a").unwrap();

    assert_eq!(list_contents(&record, "tags"), texts(&["a"]));
    assert_eq!(record.pending_operation("tags"), Some(add(&["a"])));
    assert!(record.is_key_dirty("tags"));
}

#[test]
fn test_append_then_unique_append_then_remove() {
    let mut record = Record::new("Post");
    let list = record.list_mut("tags").unwrap();
    list.append("a").unwrap();

    // Add and AddUnique cannot share one pending operation
    let err = list.append_unique("b").unwrap_err();
    assert!(err.is_incompatible_operation());
    assert_eq!(list.contents(), Some(&texts(&["a"])[..]));

    list.remove("a").unwrap();
    assert_eq!(list.contents().map(<[Value]>::len), Some(0));
    assert_eq!(record.pending_operation("tags"), None);
    assert!(!record.is_key_dirty("tags"));
}

#[test]
fn test_unique_appends_merge() {
    let mut record = Record::new("Post");
    record.add_unique("tags", "a").unwrap();
    record.add_unique("tags", "b").unwrap();
    record.add_unique("tags", "a").unwrap();

    assert_eq!(list_contents(&record, "tags"), texts(&["a", "b"]));
    assert_eq!(record.pending_operation("tags"), Some(add_unique(&["a", "b"])));

    record.remove("tags", "a").unwrap();
    assert_eq!(list_contents(&record, "tags"), texts(&["b"]));
    assert_eq!(record.pending_operation("tags"), Some(add_unique(&["b"])));
}

#[test]
fn test_add_then_add_equals_premerged_add() {
    let mut one_by_one = Record::new("Post");
    one_by_one.add("tags", "x").unwrap();
    one_by_one.add("tags", "y").unwrap();

    let mut premerged = Record::new("Post");
    let list = premerged.list_mut("tags").unwrap();
    list.append("x").unwrap();
    list.append("y").unwrap();

    assert_eq!(
        one_by_one.pending_operation("tags"),
        premerged.pending_operation("tags")
    );
    assert_eq!(one_by_one.pending_operation("tags"), Some(add(&["x", "y"])));
}

#[test]
fn test_remove_then_add_keeps_remove_pending() {
    let mut record = Record::new("Post");
    record.set("tags", List::from(texts(&["x"]))).unwrap();
    save_locally(&mut record);

    record.remove("tags", "x").unwrap();
    let err = record.add("tags", "y").unwrap_err();

    match err {
        Error::Operation(op_err) => {
            assert_eq!(op_err.key(), Some("tags"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(record.pending_operation("tags"), Some(remove(&["x"])));
    assert_eq!(list_contents(&record, "tags"), Vec::<Value>::new());
}

#[test]
fn test_remove_from_absent_attribute() {
    let mut record = Record::with_object_id("Post", "abc");
    record.remove("tags", "x").unwrap();
    assert!(!record.contains_key("tags"));
    assert_eq!(record.pending_operation("tags"), Some(remove(&["x"])));
}

#[test]
fn test_list_mut_on_other_type_is_type_mismatch() {
    let mut record = Record::new("Post");
    record.set("title", "hello").unwrap();
    let err = record.list_mut("title").unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(err.module(), "value");
}

// ===== REPLACEMENTS =====

#[test]
fn test_set_then_list_mutations_fold_into_set() {
    let mut record = Record::new("Post");
    record.set("tags", List::from(texts(&["a"]))).unwrap();
    record.add("tags", "b").unwrap();

    assert_eq!(
        record.pending_operation("tags"),
        Some(Operation::Set(Value::List(List::from(texts(&["a", "b"])))))
    );
}

#[test]
fn test_replaced_list_is_unlinked() {
    let mut record = Record::new("Post");
    record.add("tags", "a").unwrap();
    let mut old = record.unset("tags").unwrap().unwrap();

    // Mutating the unlinked value no longer reaches the record
    old.as_list_mut().unwrap().append("z").unwrap();
    assert_eq!(record.pending_operation("tags"), Some(Operation::Delete));
}

#[test]
fn test_increment_paths() {
    let mut record = Record::new("Score");
    record.increment("points", 2).unwrap();
    record.increment("points", 3).unwrap();
    assert_eq!(record.get("points"), Some(&Value::from(5)));
    assert_eq!(
        record.pending_operation("points"),
        Some(Operation::Increment(Number::Int(5)))
    );

    record.counter_mut("streak").unwrap().increment(1).unwrap();
    record.counter_mut("streak").unwrap().decrement(3).unwrap();
    assert_eq!(
        record.pending_operation("streak"),
        Some(Operation::Increment(Number::Int(-2)))
    );
}

#[test]
fn test_dictionary_changes_are_replacements() {
    let mut record = Record::new("Settings");
    let prefs = record.dictionary_mut("prefs").unwrap();
    prefs.insert("theme", "dark").unwrap();
    prefs.insert("size", 12).unwrap();

    let Some(Operation::Set(Value::Dictionary(sent))) = record.pending_operation("prefs") else {
        panic!("expected a dictionary replacement");
    };
    assert_eq!(sent.len(), 2);
    assert_eq!(sent.get("theme"), Some(&Value::from("dark")));
}

// ===== KEYS =====

#[test]
fn test_invalid_keys_are_rejected() {
    let mut record = Record::new("Post");
    for key in ["", "1st", "has-dash", "objectId", "ACL"] {
        let err = record.set(key, 1).unwrap_err();
        assert!(err.is_key_error(), "key {key:?}");
    }
    assert!(record.pending_keys().is_empty());
}

// ===== FLUSHING =====

#[test]
fn test_flush_in_flight_new_mutation_survives() {
    let mut record = Record::new("Post");
    record.add("tags", "a").unwrap();

    let snapshot = record.begin_flush().unwrap();
    assert_eq!(snapshot.operations().get("tags"), Some(&add(&["a"])));

    // Issued while the flush is on the wire
    record.add("tags", "b").unwrap();
    assert_eq!(record.pending_operation("tags"), Some(add(&["b"])));

    record
        .finish_flush(snapshot, response("k3Jd9aQe1Z"))
        .unwrap();
    assert_eq!(record.pending_operation("tags"), Some(add(&["b"])));
    assert_eq!(record.object_id(), Some("k3Jd9aQe1Z"));
    assert_eq!(list_contents(&record, "tags"), texts(&["a", "b"]));
}

#[test]
fn test_failed_flush_is_retried() {
    let mut record = Record::new("Post");
    record.add("tags", "a").unwrap();

    let snapshot = record.begin_flush().unwrap();
    record.add("tags", "b").unwrap();
    record.abort_flush(snapshot).unwrap();

    assert_eq!(record.pending_operation("tags"), Some(add(&["a", "b"])));
    let retry = record.begin_flush().unwrap();
    assert_eq!(
        retry.to_wire().get("tags"),
        Some(&json!({"__op": "Add", "objects": ["a", "b"]}))
    );
}

#[test]
fn test_concurrent_flushes_are_rejected() {
    let record = Record::new("Post");
    let _snapshot = record.begin_flush().unwrap();
    let err = record.begin_flush().unwrap_err();
    assert!(matches!(err, RecordError::FlushInProgress { .. }));
}

#[test]
fn test_to_pointer_requires_object_id() {
    let record = Record::new("Post");
    assert!(matches!(
        record.to_pointer(),
        Err(RecordError::MissingObjectId { .. })
    ));
    assert!(record.is_dirty());

    let saved = Record::with_object_id("Post", "abc");
    assert_eq!(saved.to_pointer().unwrap().object_id, "abc");
    assert!(!saved.is_dirty());
}

#[test]
fn test_save_request_shape() {
    let mut record = Record::with_object_id("Post", "abc");
    record.add("tags", "a").unwrap();
    record.increment("views", 1).unwrap();

    let snapshot = record.begin_flush().unwrap();
    let request = record.save_request(&snapshot);
    assert_eq!(request.path(), "classes/Post/abc");
    assert_eq!(
        serde_json::Value::Object(request.body),
        json!({
            "tags": {"__op": "Add", "objects": ["a"]},
            "views": {"__op": "Increment", "amount": 1},
        })
    );
}

// ===== SERVER DATA =====

#[test]
fn test_merge_server_data_replays_pending() {
    let mut record = Record::with_object_id("Post", "abc");
    record.add("tags", "local").unwrap();
    record.set("draft", true).unwrap();

    let fields = json!({
        "objectId": "abc",
        "updatedAt": "2024-05-01T12:00:00.000Z",
        "tags": ["remote"],
        "title": "From server",
    });
    record
        .merge_server_data(fields.as_object().cloned().unwrap())
        .unwrap();

    assert_eq!(list_contents(&record, "tags"), texts(&["remote", "local"]));
    assert_eq!(record.get("title"), Some(&Value::from("From server")));
    assert_eq!(record.get("draft"), Some(&Value::from(true)));
    assert!(record.updated_at().is_some());

    // Merged containers are linked to the record
    record.add("tags", "more").unwrap();
    assert_eq!(record.pending_operation("tags"), Some(add(&["local", "more"])));
}

#[test]
fn test_merge_server_data_is_all_or_nothing() {
    let mut record = Record::with_object_id("Post", "abc");
    record.set("title", "kept").unwrap();

    let fields = json!({"title": "new", "bad": {"__type": "Unknown"}});
    let err = record
        .merge_server_data(fields.as_object().cloned().unwrap())
        .unwrap_err();
    assert_eq!(err.module(), "codec");
    assert_eq!(record.get("title"), Some(&Value::from("kept")));
}

#[test]
fn test_merge_server_data_rejects_unreplayable_pending() {
    let mut record = Record::with_object_id("Post", "abc");
    record.set("title", "kept").unwrap();
    record.increment("views", 1).unwrap();

    let fields = json!({"title": "new", "views": "many"});
    let err = record
        .merge_server_data(fields.as_object().cloned().unwrap())
        .unwrap_err();
    assert_eq!(err.module(), "operation");
    assert_eq!(record.get("title"), Some(&Value::from("kept")));
    assert_eq!(record.get("views"), Some(&Value::from(1)));
    assert_eq!(
        record.pending_operation("views"),
        Some(Operation::Increment(Number::Int(1)))
    );
}

// ===== WIRE TAGS =====

#[test]
fn test_set_dictionary_keyed_by_wire_tag_fails() {
    let mut record = Record::new("Post");
    for tag in ["__op", "__type"] {
        let dict: Dictionary = [(tag, "Delete")].into_iter().collect();
        let err = record.set("score", dict).unwrap_err();
        assert_eq!(err.module(), "value");
    }
    assert_eq!(record.get("score"), None);
    assert_eq!(record.pending_operation("score"), None);

    // Nested inside a list element
    let dict: Dictionary = [("__op", "Delete")].into_iter().collect();
    assert!(record.add("scores", dict).is_err());
    assert_eq!(record.pending_operation("scores"), None);
}

#[test]
fn test_dictionary_insert_of_wire_tag_leaves_record_unchanged() {
    let mut record = Record::new("Post");
    record.dictionary_mut("meta").unwrap().insert("lang", "en").unwrap();
    let before = record.pending_operation("meta");

    let meta = record.dictionary_mut("meta").unwrap();
    assert!(meta.insert("__type", "Secret").is_err());
    assert!(!meta.contains_key("__type"));
    assert_eq!(record.pending_operation("meta"), before);
}

/// Completes a flush of `record` as if the store had accepted it
fn save_locally(record: &mut Record) {
    let snapshot = record.begin_flush().unwrap();
    let id = record.object_id().unwrap_or("k3Jd9aQe1Z").to_string();
    record.finish_flush(snapshot, response(&id)).unwrap();
}

fn response(object_id: &str) -> nimbus::remote::SaveResponse {
    nimbus::remote::SaveResponse {
        object_id: object_id.to_string(),
        created_at: Some(chrono::Utc::now()),
        updated_at: chrono::Utc::now(),
    }
}
