use nimbus::{Operation, Record, Value, remote::InMemoryStore};

// Re-export tokio test macro for convenience
pub use tokio;

/// Strings as values, for building operands and expected contents
pub fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

pub fn add(values: &[&str]) -> Operation {
    Operation::Add(texts(values))
}

pub fn add_unique(values: &[&str]) -> Operation {
    Operation::AddUnique(texts(values))
}

pub fn remove(values: &[&str]) -> Operation {
    Operation::Remove(texts(values))
}

/// Contents of the list stored under `key`, panicking if there is none
pub fn list_contents(record: &Record, key: &str) -> Vec<Value> {
    record
        .get(key)
        .and_then(Value::as_list)
        .and_then(|list| list.contents())
        .map(<[Value]>::to_vec)
        .unwrap_or_else(|| panic!("No materialized list under '{key}'"))
}

/// Creates a record of `class_name`, lets `setup` populate it, and saves it
pub async fn saved_record(
    store: &InMemoryStore,
    class_name: &str,
    setup: impl FnOnce(&mut Record),
) -> Record {
    let mut record = Record::new(class_name);
    setup(&mut record);
    record.save(store).await.expect("Failed to save record");
    record
}
