//! Lookup filters for document commands.
//!
//! A [`Filter`] selects one document by `_id`, given either as plain text or
//! as an object id. A [`Query`] is the general equality filter a store
//! evaluates; `list-docs` accepts one directly as JSON.

use serde_json::{Map, Value};

use crate::error::{DocError, DocResult};
use crate::extjson::{into_document, oid_value, Document};
use crate::object_id::ObjectId;

/// Selection of one document by its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// `_id` equals this string exactly.
    Id(String),
    /// `_id` equals this object id.
    ObjectId(ObjectId),
}

/// Build a filter from the `-i` / `-o` command-line values.
///
/// Exactly one must be given.
pub fn build(id: Option<&str>, object_id: Option<&str>) -> DocResult<Filter> {
    match (id, object_id) {
        (None, None) => Err(DocError::MissingIdentifier),
        (Some(_), Some(_)) => Err(DocError::ConflictingIdentifiers),
        (Some(id), None) => Ok(Filter::Id(id.to_string())),
        (None, Some(hex)) => ObjectId::parse_str(hex.trim()).map(Filter::ObjectId),
    }
}

impl Filter {
    /// The `_id` value this filter looks for, in canonical extended JSON.
    pub fn id_value(&self) -> Value {
        match self {
            Filter::Id(id) => Value::String(id.clone()),
            Filter::ObjectId(oid) => oid_value(*oid),
        }
    }

    /// The equivalent store query.
    pub fn to_query(&self) -> Query {
        let mut fields = Map::new();
        fields.insert("_id".to_string(), self.id_value());
        Query(fields)
    }
}

/// An equality query: every field must equal the document's field.
///
/// Field names may be dotted paths into nested objects. A document array
/// field matches a scalar when any element equals it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query(Map<String, Value>);

impl Query {
    /// The query matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a query from JSON text such as `{"status": "open"}`.
    pub fn parse(text: &str) -> DocResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| DocError::InvalidFilter(e.to_string()))?;
        into_document(value)
            .map(Query)
            .map_err(|e| DocError::InvalidFilter(e.to_string()))
    }

    /// The query's fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns `true` if `doc` satisfies every field of the query.
    pub fn matches(&self, doc: &Document) -> bool {
        self.0.iter().all(|(path, expected)| match lookup(doc, path) {
            Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }
}

impl From<Document> for Query {
    fn from(fields: Document) -> Self {
        Query(fields)
    }
}

/// The value at a dotted `path` inside `doc`.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    if let Some(value) = doc.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
