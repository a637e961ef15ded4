//! The closed set of value types and what each one looks like as JSON.
//!
//! [`ValueTag`] is the single place that maps store type names to value
//! types. Every per-tag table in this module is an exhaustive `match`, so a
//! new variant cannot be added without deciding its shape, scaffold, store
//! type name and read primitive.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{KvError, KvResult, StoreResult};
use crate::raw::RawValue;
use crate::traits::{KeyValueStore, TYPE_NONE};

/// A value type supported by the key-value tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTag {
    String,
    List,
    Hash,
    Set,
    SortedSet,
    Bitmap,
    HyperLogLogSet,
}

impl ValueTag {
    /// Every supported tag.
    pub const ALL: [ValueTag; 7] = [
        ValueTag::String,
        ValueTag::List,
        ValueTag::Hash,
        ValueTag::Set,
        ValueTag::SortedSet,
        ValueTag::Bitmap,
        ValueTag::HyperLogLogSet,
    ];

    /// The type name a store reports for values of this tag.
    pub fn store_type_name(self) -> &'static str {
        match self {
            ValueTag::String => "string",
            ValueTag::List => "list",
            ValueTag::Hash => "hash",
            ValueTag::Set => "set",
            ValueTag::SortedSet => "zset",
            ValueTag::Bitmap => "bitmap",
            ValueTag::HyperLogLogSet => "hyperloglog",
        }
    }

    /// The short name used by command-line type flags.
    pub fn flag_name(self) -> &'static str {
        match self {
            ValueTag::String => "string",
            ValueTag::List => "list",
            ValueTag::Hash => "hash",
            ValueTag::Set => "set",
            ValueTag::SortedSet => "zset",
            ValueTag::Bitmap => "bits",
            ValueTag::HyperLogLogSet => "hyll",
        }
    }

    /// Parse a command-line type flag name.
    pub fn from_flag_name(name: &str) -> Option<ValueTag> {
        ValueTag::ALL.into_iter().find(|t| t.flag_name() == name)
    }

    /// The tag whose write primitive replaces a value of this tag after an
    /// edit.
    ///
    /// A bitmap is edited as its raw text and written back whole, because a
    /// single `{offset, value}` assignment cannot express every bit.
    pub fn edit_tag(self) -> ValueTag {
        match self {
            ValueTag::Bitmap => ValueTag::String,
            other => other,
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// The JSON shape a value of some tag takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanonicalShape {
    /// A string (numbers are accepted and stored as their text).
    Scalar,
    /// An array of scalars.
    Sequence,
    /// An object of field to scalar, or an array of `[field, value]` pairs.
    Mapping,
    /// An object of member to numeric score, or an array of `[member, score]`
    /// pairs.
    ScoredMapping,
    /// An object `{"offset": <integer>, "value": 0 | 1}`.
    BitAssignment,
}

impl fmt::Display for CanonicalShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CanonicalShape::Scalar => "a string or number",
            CanonicalShape::Sequence => "a non-empty array of strings or numbers",
            CanonicalShape::Mapping => "a non-empty object of strings, or an array of [field, value] pairs",
            CanonicalShape::ScoredMapping => {
                "a non-empty object of numeric scores, or an array of [member, score] pairs"
            }
            CanonicalShape::BitAssignment => "an object {\"offset\": <integer>, \"value\": 0 or 1}",
        };
        f.write_str(text)
    }
}

/// The canonical JSON shape for `tag`.
pub fn shape_for(tag: ValueTag) -> CanonicalShape {
    match tag {
        ValueTag::String => CanonicalShape::Scalar,
        ValueTag::List | ValueTag::Set | ValueTag::HyperLogLogSet => CanonicalShape::Sequence,
        ValueTag::Hash => CanonicalShape::Mapping,
        ValueTag::SortedSet => CanonicalShape::ScoredMapping,
        ValueTag::Bitmap => CanonicalShape::BitAssignment,
    }
}

/// Example value presented when creating a new key of `tag`.
pub fn scaffold_for(tag: ValueTag) -> Value {
    match tag {
        ValueTag::String => json!("value"),
        ValueTag::List | ValueTag::Set => json!(["value1", "value2", "value3"]),
        ValueTag::Hash => json!({"key1": "value1", "key2": "value2"}),
        ValueTag::SortedSet => json!({"key1": 1.1, "key2": 1.2}),
        ValueTag::Bitmap => json!({"offset": 1, "value": 1}),
        ValueTag::HyperLogLogSet => json!(["1", "2", "3", "4"]),
    }
}

/// Map a store type name to a tag.
///
/// Streams, geospatial indexes and any name not produced by
/// [`ValueTag::store_type_name`] are rejected as unsupported.
pub fn tag_for_store_type(type_name: &str) -> KvResult<ValueTag> {
    ValueTag::ALL
        .into_iter()
        .find(|t| t.store_type_name() == type_name)
        .ok_or_else(|| KvError::UnsupportedType {
            type_name: type_name.to_string(),
        })
}

/// Determine the tag of the value stored at `key`.
pub fn resolve_tag<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> KvResult<ValueTag> {
    let type_name = store.key_type(key.as_bytes())?;
    if type_name == TYPE_NONE {
        return Err(KvError::KeyNotFound {
            key: key.to_string(),
        });
    }
    tag_for_store_type(&type_name)
}

/// Read the whole value at `key` with the read primitive for `tag`.
pub fn fetch<S: KeyValueStore + ?Sized>(store: &S, tag: ValueTag, key: &str) -> StoreResult<RawValue> {
    let key = key.as_bytes();
    let raw = match tag {
        ValueTag::String | ValueTag::Bitmap | ValueTag::HyperLogLogSet => {
            store.get(key)?.map_or(RawValue::Nil, RawValue::Bytes)
        }
        ValueTag::List => RawValue::byte_array(store.lrange(key, 0, -1)?),
        ValueTag::Set => RawValue::byte_array(store.smembers(key)?),
        ValueTag::Hash => RawValue::Map(
            store
                .hgetall(key)?
                .into_iter()
                .map(|(f, v)| (RawValue::Bytes(f), RawValue::Bytes(v)))
                .collect(),
        ),
        ValueTag::SortedSet => RawValue::Map(
            store
                .zrange_with_scores(key, 0, -1)?
                .into_iter()
                .map(|(m, s)| (RawValue::Bytes(m), RawValue::Float(s)))
                .collect(),
        ),
    };
    Ok(raw)
}
