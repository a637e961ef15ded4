//! Read-only display of keys and values.

use serde_json::{json, Map, Value};

use crate::decode::{decode, decode_text};
use crate::error::{KvError, KvResult};
use crate::raw::RawValue;
use crate::registry::{fetch, resolve_tag, ValueTag};
use crate::traits::KeyValueStore;

/// Display form of a raw value: leaves that are not text become arrays of
/// byte values instead of failing the whole value.
fn lenient(raw: &RawValue) -> Value {
    if let Ok(value) = decode(raw) {
        return value;
    }
    match raw {
        RawValue::Bytes(bytes) => match decode_text(bytes) {
            Ok(text) => Value::String(text),
            Err(_) => Value::Array(bytes.iter().map(|b| json!(b)).collect()),
        },
        RawValue::Array(items) => Value::Array(items.iter().map(lenient).collect()),
        RawValue::Map(pairs) => {
            let mut object = Map::new();
            for (key, value) in pairs {
                let name = match key {
                    RawValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    other => lenient(other).to_string(),
                };
                object.insert(name, lenient(value));
            }
            Value::Object(object)
        }
        other => decode(other).unwrap_or(Value::Null),
    }
}

/// Offsets of the set bits in a bitmap, most significant bit first.
fn set_bits(bytes: &[u8]) -> Vec<u64> {
    bytes
        .iter()
        .enumerate()
        .flat_map(|(index, byte)| {
            (0..8u64)
                .filter(move |bit| byte & (0x80u8 >> *bit) != 0)
                .map(move |bit| index as u64 * 8 + bit)
        })
        .collect()
}

/// The displayed JSON for the value at `key`.
///
/// Bitmaps show the offsets of their set bits and HyperLogLogs their
/// cardinality.
pub fn show_value<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> KvResult<Value> {
    let tag = resolve_tag(store, key)?;
    let value = match tag {
        ValueTag::Bitmap => {
            let bytes = store.get(key.as_bytes())?.unwrap_or_default();
            json!(set_bits(&bytes))
        }
        ValueTag::HyperLogLogSet => json!({"cardinality": store.pfcount(key.as_bytes())?}),
        _ => lenient(&fetch(store, tag, key)?),
    };
    Ok(value)
}

/// One display line: `key : <compact json>`.
pub fn format_line(key: &str, value: &Value) -> String {
    format!("{key} : {value}")
}

/// Display lines for one key, or for every key matching `pattern`.
///
/// Keys holding an unsupported type produce an `Unsupported value in key`
/// line instead of failing the listing.
pub fn show_db<S: KeyValueStore + ?Sized>(store: &S, key: Option<&str>, pattern: &str) -> KvResult<Vec<String>> {
    let keys = match key {
        Some(key) => {
            if !store.exists(key.as_bytes())? {
                return Err(KvError::KeyNotFound { key: key.to_string() });
            }
            vec![key.to_string()]
        }
        None => store
            .keys(pattern)?
            .into_iter()
            .map(|k| String::from_utf8_lossy(&k).into_owned())
            .collect(),
    };

    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        match show_value(store, &key) {
            Ok(value) => lines.push(format_line(&key, &value)),
            Err(KvError::UnsupportedType { .. }) => lines.push(format!("Unsupported value in key: {key}")),
            Err(e) => return Err(e),
        }
    }
    Ok(lines)
}

/// Keys starting with `prefix` (a glob pattern prefix), in sorted order.
pub fn list_keys<S: KeyValueStore + ?Sized>(store: &S, prefix: &str) -> KvResult<Vec<String>> {
    Ok(store
        .keys(&format!("{prefix}*"))?
        .into_iter()
        .map(|k| String::from_utf8_lossy(&k).into_owned())
        .collect())
}
