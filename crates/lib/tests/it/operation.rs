//! Operation and reducer integration tests
//!
//! The reducer table is exercised pair by pair, then checked as a whole with
//! property tests: whenever two operations reduce, applying the reduced
//! operation to a stored value must give what applying both in order gives.

use nimbus::{
    Operation, Value,
    operation::{OperationError, OperationKind, reduce},
    value::{List, Number},
};
use proptest::prelude::*;

use crate::helpers::*;

// ===== REDUCTION TABLE =====

#[test]
fn test_set_absorbs_list_operations() {
    let pending = Operation::Set(Value::List(List::from(texts(&["a"]))));

    let reduced = reduce("tags", Some(&pending), add(&["b"])).unwrap();
    assert_eq!(
        reduced,
        Some(Operation::Set(Value::List(List::from(texts(&["a", "b"])))))
    );

    let reduced = reduce("tags", reduced.as_ref(), remove(&["a"])).unwrap();
    assert_eq!(
        reduced,
        Some(Operation::Set(Value::List(List::from(texts(&["b"])))))
    );
}

#[test]
fn test_delete_then_increment_sets_amount() {
    let reduced = reduce("score", Some(&Operation::Delete), Operation::Increment(Number::Int(3)));
    assert_eq!(
        reduced.unwrap(),
        Some(Operation::Set(Value::Number(Number::Int(3))))
    );
}

#[test]
fn test_delete_then_remove_stays_delete() {
    let reduced = reduce("tags", Some(&Operation::Delete), remove(&["a"])).unwrap();
    assert_eq!(reduced, Some(Operation::Delete));
}

#[test]
fn test_increments_sum() {
    let pending = Operation::Increment(Number::Int(2));
    let reduced = reduce("n", Some(&pending), Operation::Increment(Number::Float(0.5))).unwrap();
    assert_eq!(reduced, Some(Operation::Increment(Number::Float(2.5))));
}

#[test]
fn test_replacement_overrides_anything() {
    for pending in [
        add(&["a"]),
        add_unique(&["a"]),
        remove(&["a"]),
        Operation::Increment(Number::Int(1)),
        Operation::Delete,
    ] {
        let reduced = reduce("k", Some(&pending), Operation::Set("x".into())).unwrap();
        assert_eq!(reduced, Some(Operation::Set("x".into())), "after {pending}");

        let reduced = reduce("k", Some(&pending), Operation::Delete).unwrap();
        assert_eq!(reduced, Some(Operation::Delete), "after {pending}");
    }
}

#[test]
fn test_incompatible_pairs() {
    let pairs = [
        (Operation::Increment(Number::Int(1)), add(&["a"])),
        (add(&["a"]), Operation::Increment(Number::Int(1))),
        (add(&["a"]), add_unique(&["b"])),
        (add_unique(&["a"]), add(&["b"])),
        (remove(&["a"]), add(&["b"])),
        (remove(&["a"]), add_unique(&["b"])),
        (Operation::Set("text".into()), Operation::Increment(Number::Int(1))),
        (Operation::Set(1.into()), add(&["a"])),
    ];

    for (pending, incoming) in pairs {
        let expected = OperationError::IncompatibleOperation {
            key: "k".to_string(),
            pending: pending.kind(),
            incoming: incoming.kind(),
        };
        let err = reduce("k", Some(&pending), incoming).unwrap_err();
        assert!(err.is_incompatible());
        assert_eq!(err.key(), Some("k"));
        assert_eq!(err, expected);
    }
}

#[test]
fn test_error_message_names_both_kinds() {
    let err = reduce("tags", Some(&add(&["a"])), add_unique(&["b"])).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("tags"), "{message}");
    assert!(message.contains(OperationKind::Add.wire_name()), "{message}");
    assert!(message.contains(OperationKind::AddUnique.wire_name()), "{message}");
}

// ===== SERVER-SIDE APPLICATION =====

#[test]
fn test_apply_matches_server_semantics() {
    let stored = Value::List(List::from(texts(&["a", "b", "a"])));

    assert_eq!(
        add_unique(&["a", "c"]).apply(Some(&stored)).unwrap(),
        Some(Value::List(List::from(texts(&["a", "b", "a", "c"]))))
    );
    assert_eq!(
        remove(&["a"]).apply(Some(&stored)).unwrap(),
        Some(Value::List(List::from(texts(&["b"]))))
    );
    assert_eq!(
        add(&["z"]).apply(None).unwrap(),
        Some(Value::List(List::from(texts(&["z"]))))
    );
    assert_eq!(Operation::Delete.apply(Some(&stored)).unwrap(), None);
}

// ===== PROPERTIES =====

fn arb_element() -> impl Strategy<Value = Value> {
    prop::sample::select(vec!["a", "b", "c"]).prop_map(Value::from)
}

fn arb_elements() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(arb_element(), 0..4)
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        arb_elements().prop_map(Operation::Add),
        arb_elements().prop_map(Operation::AddUnique),
        arb_elements().prop_map(Operation::Remove),
        arb_elements().prop_map(|e| Operation::Set(Value::List(List::from(e)))),
        (-5i64..5).prop_map(|n| Operation::Set(Value::from(n))),
        (-5i64..5).prop_map(|n| Operation::Increment(Number::Int(n))),
        Just(Operation::Delete),
    ]
}

/// Stored values whose elements never occur in generated operations
fn arb_stored() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        prop::collection::vec(prop::sample::select(vec!["p", "q"]), 0..3).prop_map(|e| Some(
            Value::List(e.into_iter().map(Value::from).collect())
        )),
        (-5i64..5).prop_map(|n| Some(Value::from(n))),
    ]
}

/// An empty list and an absent value are indistinguishable to readers
fn normalize(value: Option<Value>) -> Option<Value> {
    match value {
        Some(Value::List(list)) if list.is_empty() => None,
        other => other,
    }
}

fn apply_all(stored: Option<Value>, operations: &[&Operation]) -> Option<Option<Value>> {
    let mut current = stored;
    for operation in operations {
        current = operation.apply(current.as_ref()).ok()?;
    }
    Some(normalize(current))
}

proptest! {
    #[test]
    fn prop_reduced_operation_is_equivalent(
        pending in arb_operation(),
        incoming in arb_operation(),
        stored in arb_stored(),
    ) {
        let Some(sequential) = apply_all(stored.clone(), &[&pending, &incoming]) else {
            return Ok(());
        };
        let Ok(reduced) = reduce("k", Some(&pending), incoming.clone()) else {
            return Ok(());
        };

        let combined = match &reduced {
            Some(operation) => apply_all(stored, &[operation]),
            None => Some(normalize(stored)),
        };
        prop_assert_eq!(combined, Some(sequential), "reduced to {:?}", reduced);
    }

    #[test]
    fn prop_replacements_always_reduce(
        pending in arb_operation(),
        value in arb_elements(),
    ) {
        let set = Operation::Set(Value::List(List::from(value)));
        prop_assert_eq!(reduce("k", Some(&pending), set.clone()).unwrap(), Some(set));
        prop_assert_eq!(
            reduce("k", Some(&pending), Operation::Delete).unwrap(),
            Some(Operation::Delete)
        );
    }
}
