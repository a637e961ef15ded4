//! Type-directed writes of JSON values.
//!
//! Writing is two steps. [`normalize`] checks the JSON shape against the tag
//! and produces one canonical [`TypedValue`]; only then does [`apply`] issue
//! the single store primitive for that tag. Malformed input therefore never
//! reaches the store.
//!
//! Hash and sorted-set input is accepted in two forms, an object or an array
//! of two-element pairs. Both collapse into the same pair list here, with the
//! later entry winning when a field repeats.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{KvError, KvResult, StoreResult};
use crate::registry::{shape_for, ValueTag};
use crate::traits::KeyValueStore;

/// A value checked against its tag and converted to store arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    String(Vec<u8>),
    List(Vec<Vec<u8>>),
    Set(Vec<Vec<u8>>),
    HyperLogLog(Vec<Vec<u8>>),
    Hash(Vec<(Vec<u8>, Vec<u8>)>),
    SortedSet(Vec<(Vec<u8>, f64)>),
    Bit { offset: u64, value: bool },
}

impl TypedValue {
    /// The tag this value will be written as.
    pub fn tag(&self) -> ValueTag {
        match self {
            TypedValue::String(_) => ValueTag::String,
            TypedValue::List(_) => ValueTag::List,
            TypedValue::Set(_) => ValueTag::Set,
            TypedValue::HyperLogLog(_) => ValueTag::HyperLogLogSet,
            TypedValue::Hash(_) => ValueTag::Hash,
            TypedValue::SortedSet(_) => ValueTag::SortedSet,
            TypedValue::Bit { .. } => ValueTag::Bitmap,
        }
    }
}

fn malformed(tag: ValueTag, detail: impl Into<String>) -> KvError {
    KvError::MalformedValue {
        tag,
        expected: shape_for(tag),
        detail: detail.into(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convert a JSON scalar to the bytes a store keeps.
fn scalar_bytes(tag: ValueTag, value: &Value) -> KvResult<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Number(n) => Ok(n.to_string().into_bytes()),
        other => Err(malformed(tag, format!("found {}", kind_of(other)))),
    }
}

fn score_of(tag: ValueTag, member: &[u8], value: &Value) -> KvResult<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if !s.is_nan() => Ok(s),
        _ => Err(malformed(
            tag,
            format!(
                "score for member {:?} is not numeric: {value}",
                String::from_utf8_lossy(member)
            ),
        )),
    }
}

fn sequence(tag: ValueTag, value: &Value) -> KvResult<Vec<Vec<u8>>> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed(tag, format!("found {}", kind_of(value))))?;
    if items.is_empty() {
        return Err(malformed(tag, "found an empty array"));
    }
    items.iter().map(|item| scalar_bytes(tag, item)).collect()
}

/// Collapse an object or an array of pairs into `(field, value)` entries.
fn pairs(tag: ValueTag, value: &Value) -> KvResult<Vec<(Vec<u8>, &Value)>> {
    let entries: Vec<(Vec<u8>, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.as_bytes().to_vec(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([field, value]) => Ok((scalar_bytes(tag, field)?, value)),
                _ => Err(malformed(
                    tag,
                    format!("array entries must be two-element pairs, found {item}"),
                )),
            })
            .collect::<KvResult<_>>()?,
        other => return Err(malformed(tag, format!("found {}", kind_of(other)))),
    };
    if entries.is_empty() {
        return Err(malformed(tag, "no entries"));
    }
    Ok(entries)
}

/// Check `value` against the shape of `tag` and convert it to store arguments.
pub fn normalize(tag: ValueTag, value: &Value) -> KvResult<TypedValue> {
    match tag {
        ValueTag::String => scalar_bytes(tag, value).map(TypedValue::String),
        ValueTag::List => sequence(tag, value).map(TypedValue::List),
        ValueTag::Set => sequence(tag, value).map(TypedValue::Set),
        ValueTag::HyperLogLogSet => sequence(tag, value).map(TypedValue::HyperLogLog),
        ValueTag::Hash => {
            let mut fields = BTreeMap::new();
            for (field, v) in pairs(tag, value)? {
                fields.insert(field, scalar_bytes(tag, v)?);
            }
            Ok(TypedValue::Hash(fields.into_iter().collect()))
        }
        ValueTag::SortedSet => {
            let mut members = BTreeMap::new();
            for (member, v) in pairs(tag, value)? {
                let score = score_of(tag, &member, v)?;
                members.insert(member, score);
            }
            Ok(TypedValue::SortedSet(members.into_iter().collect()))
        }
        ValueTag::Bitmap => {
            let object = value
                .as_object()
                .ok_or_else(|| malformed(tag, format!("found {}", kind_of(value))))?;
            let offset = object
                .get("offset")
                .and_then(Value::as_u64)
                .ok_or_else(|| malformed(tag, "offset must be a non-negative integer"))?;
            let bit = match object.get("value").and_then(Value::as_u64) {
                Some(0) => false,
                Some(1) => true,
                _ => return Err(malformed(tag, "value must be 0 or 1")),
            };
            Ok(TypedValue::Bit { offset, value: bit })
        }
    }
}

/// Issue the store primitive for an already normalized value.
pub fn apply<S: KeyValueStore + ?Sized>(store: &S, key: &[u8], value: &TypedValue) -> StoreResult<()> {
    match value {
        TypedValue::String(bytes) => store.set(key, bytes),
        TypedValue::List(items) => store.rpush(key, items).map(drop),
        TypedValue::Set(members) => store.sadd(key, members).map(drop),
        TypedValue::HyperLogLog(elements) => store.pfadd(key, elements).map(drop),
        TypedValue::Hash(fields) => store.hset_multiple(key, fields),
        TypedValue::SortedSet(members) => store.zadd_multiple(key, members).map(drop),
        TypedValue::Bit { offset, value } => store.setbit(key, *offset, *value).map(drop),
    }
}

/// Write `value` at `key` as a value of type `tag`.
///
/// The shape is checked before the store is touched. A store failure during
/// the single write is reported as is; nothing is rolled back.
pub fn write<S: KeyValueStore + ?Sized>(store: &S, tag: ValueTag, key: &str, value: &Value) -> KvResult<()> {
    let typed = normalize(tag, value)?;
    apply(store, key.as_bytes(), &typed)?;
    debug!(key, %tag, "value written");
    Ok(())
}
