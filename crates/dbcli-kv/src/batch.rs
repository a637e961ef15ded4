//! Bulk creation of keys from one JSON object.
//!
//! Each entry's type is sniffed from its JSON shape: an object becomes a
//! hash, an array a list and anything else a string. The whole object is
//! validated before a single [`Batch`] is submitted.

use dbcli_editor::{EditOptions, EditOutcome, Editor};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::encode::{normalize, TypedValue};
use crate::error::{KvError, KvResult};
use crate::registry::{shape_for, ValueTag};
use crate::session::to_pretty_json;
use crate::traits::{Batch, KeyValueStore};

/// Seed shown when bulk-adding keys.
pub fn batch_scaffold() -> Value {
    json!({"key1": "value1", "key2": "value2"})
}

/// The tag a batch entry is written as, judged from its JSON shape alone.
pub fn sniff(value: &Value) -> ValueTag {
    match value {
        Value::Object(_) => ValueTag::Hash,
        Value::Array(_) => ValueTag::List,
        _ => ValueTag::String,
    }
}

/// Validate every entry of `data` and queue it onto one batch.
pub fn build_batch(data: &Value) -> KvResult<Batch> {
    let Value::Object(entries) = data else {
        return Err(KvError::MalformedValue {
            tag: ValueTag::Hash,
            expected: shape_for(ValueTag::Hash),
            detail: "bulk input must be an object of key/value entries".into(),
        });
    };
    let mut batch = Batch::new();
    for (key, value) in entries {
        let tag = sniff(value);
        match normalize(tag, value)? {
            TypedValue::String(bytes) => batch.set(key.as_str(), bytes),
            TypedValue::List(items) => batch.rpush(key.as_str(), items),
            TypedValue::Hash(fields) => batch.hset(key.as_str(), fields),
            other => {
                return Err(KvError::MalformedValue {
                    tag,
                    expected: shape_for(tag),
                    detail: format!("entry {key:?} cannot be queued as {}", other.tag()),
                })
            }
        };
    }
    Ok(batch)
}

/// Write every entry of `data` in one batch. Returns the keys written.
pub fn add_data<S: KeyValueStore + ?Sized>(store: &S, data: &Value) -> KvResult<Vec<String>> {
    let batch = build_batch(data)?;
    debug!(ops = batch.len(), "submitting batch");
    store.execute(&batch)?;
    let keys: Vec<String> = batch
        .ops()
        .iter()
        .map(|op| String::from_utf8_lossy(op.key()).into_owned())
        .collect();
    info!(count = keys.len(), "bulk add complete");
    Ok(keys)
}

/// Open the editor on the batch scaffold and write what comes back.
pub fn run_add_data<S, E>(store: &S, editor: &E) -> KvResult<EditOutcome<Vec<String>>>
where
    S: KeyValueStore + ?Sized,
    E: Editor + ?Sized,
{
    let seed = to_pretty_json(&batch_scaffold());
    let Some(edited) = editor.edit(&seed, &EditOptions::create())? else {
        return Ok(EditOutcome::Unchanged);
    };
    let data: Value = match serde_json::from_str(&edited) {
        Ok(value) => value,
        Err(e) => return Ok(EditOutcome::InvalidJson(e.to_string())),
    };
    add_data(store, &data).map(EditOutcome::Committed)
}
