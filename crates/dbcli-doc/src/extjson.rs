//! Extended JSON: the text form of documents.
//!
//! Documents are stored and edited in canonical form, where typed values
//! are wrapped in single-key objects: `{"$oid": "<hex>"}` for object ids and
//! `{"$date": <millis>}` (or an ISO-8601 string) for timestamps. The relaxed
//! form shown by `show-doc` unwraps them into plain strings.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::error::{DocError, DocResult};
use crate::object_id::ObjectId;

/// A document: an ordered JSON object in canonical extended JSON.
pub type Document = Map<String, Value>;

fn single<'a>(value: &'a Value, marker: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(marker),
        _ => None,
    }
}

/// Canonical form of an object id.
pub fn oid_value(id: ObjectId) -> Value {
    json!({"$oid": id.to_hex()})
}

/// Canonical form of a timestamp.
pub fn date_value(time: DateTime<Utc>) -> Value {
    json!({"$date": time.timestamp_millis()})
}

/// The object id wrapped in `value`, if it is a valid `{"$oid": ...}`.
pub fn as_object_id(value: &Value) -> Option<ObjectId> {
    single(value, "$oid")
        .and_then(Value::as_str)
        .and_then(|hex| ObjectId::parse_str(hex).ok())
}

/// The timestamp wrapped in `value`, if it is a valid `{"$date": ...}`.
///
/// Accepts milliseconds since the epoch, `{"$numberLong": "<millis>"}` and
/// RFC 3339 text.
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    let inner = single(value, "$date")?;
    let millis = match inner {
        Value::Number(n) => n.as_i64(),
        Value::String(text) => {
            return DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|t| t.with_timezone(&Utc))
        }
        other => single(other, "$numberLong")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok()),
    }?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Render a timestamp as ISO-8601 text.
pub fn iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Relaxed form of `value`: object ids become hex strings and timestamps
/// ISO-8601 text, recursively.
pub fn relaxed(value: &Value) -> Value {
    if let Some(id) = as_object_id(value) {
        return Value::String(id.to_hex());
    }
    if let Some(time) = as_date(value) {
        return Value::String(iso8601(time));
    }
    match value {
        Value::Array(items) => Value::Array(items.iter().map(relaxed).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), relaxed(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Reject malformed type wrappers anywhere in `value`.
///
/// An object whose only key is `$oid` must hold a valid object id.
fn validate(value: &Value) -> DocResult<()> {
    match value {
        Value::Object(map) => {
            if let Some(inner) = single(value, "$oid") {
                let text = inner.as_str().unwrap_or_default();
                ObjectId::parse_str(text)?;
                return Ok(());
            }
            map.values().try_for_each(validate)
        }
        Value::Array(items) => items.iter().try_for_each(validate),
        _ => Ok(()),
    }
}

/// Turn a parsed JSON value into a document.
pub fn into_document(value: Value) -> DocResult<Document> {
    validate(&value)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DocError::NotADocument(format!(
            "expected a JSON object, found {}",
            match other {
                Value::Array(_) => "an array",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                Value::Null => "null",
                Value::Object(_) => "an object",
            }
        ))),
    }
}

/// Parse extended JSON text into a document.
pub fn parse_document(text: &str) -> Result<DocResult<Document>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(into_document(value))
}

/// Pretty JSON with 4-space indentation.
pub fn to_pretty_json(value: &Value) -> String {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    if serde::Serialize::serialize(value, &mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}
