use std::fmt;

use serde_json::Value;

use crate::error::{DocError, DocResult};
use crate::extjson::Document;
use crate::filter::Query;

/// A database and collection pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    /// Create a namespace from known names.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Build a namespace from optional command-line values.
    ///
    /// Document commands need both names.
    pub fn require(database: Option<&str>, collection: Option<&str>) -> DocResult<Self> {
        match (database, collection) {
            (Some(db), Some(coll)) if !db.is_empty() && !coll.is_empty() => Ok(Self::new(db, coll)),
            _ => Err(DocError::MissingNamespace(
                "both collection and database names must be set",
            )),
        }
    }

    /// Check that a database name is present, for collection listing.
    pub fn require_database(database: Option<&str>) -> DocResult<&str> {
        database
            .filter(|db| !db.is_empty())
            .ok_or(DocError::MissingNamespace("a database name must be set"))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Document store holding databases of collections of documents.
///
/// Implementations must satisfy these invariants:
/// - Every stored document has an `_id`, unique within its collection.
/// - A document's `_id` never changes once stored.
/// - Databases and collections come into existence on first insert.
/// - Listings are sorted by name; documents keep insertion order.
pub trait DocumentStore: Send + Sync {
    /// Names of all databases.
    fn list_databases(&self) -> DocResult<Vec<String>>;

    /// Names of the collections in `database`. Empty if it does not exist.
    fn list_collections(&self, database: &str) -> DocResult<Vec<String>>;

    /// All documents in `ns` matching `query`, in insertion order.
    fn find(&self, ns: &Namespace, query: &Query) -> DocResult<Vec<Document>>;

    /// The first document in `ns` matching `query`.
    fn find_one(&self, ns: &Namespace, query: &Query) -> DocResult<Option<Document>> {
        Ok(self.find(ns, query)?.into_iter().next())
    }

    /// Insert `doc` and return its `_id`.
    ///
    /// A fresh object id is generated when the document has none.
    fn insert_one(&self, ns: &Namespace, doc: Document) -> DocResult<Value>;

    /// Replace the first document matching `query`. Returns `false` if none
    /// matched.
    fn replace_one(&self, ns: &Namespace, query: &Query, doc: Document) -> DocResult<bool>;

    /// Delete the first document matching `query`. Returns `true` if one was
    /// deleted.
    fn delete_one(&self, ns: &Namespace, query: &Query) -> DocResult<bool>;
}
