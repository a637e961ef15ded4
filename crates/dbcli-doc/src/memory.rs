use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{DocError, DocResult};
use crate::extjson::{oid_value, Document};
use crate::filter::Query;
use crate::object_id::ObjectId;
use crate::traits::{DocumentStore, Namespace};

/// Every database, collection and document held by a store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    databases: BTreeMap<String, BTreeMap<String, Vec<Document>>>,
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `doc` with `id` as its first field.
fn with_id_first(id: Value, doc: Document) -> Document {
    let mut out = Document::new();
    out.insert("_id".to_string(), id);
    for (k, v) in doc {
        if k != "_id" {
            out.insert(k, v);
        }
    }
    out
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of documents.
    pub fn document_count(&self) -> usize {
        self.databases
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    fn collection(&self, ns: &Namespace) -> Option<&Vec<Document>> {
        self.databases.get(&ns.database)?.get(&ns.collection)
    }

    fn collection_mut(&mut self, ns: &Namespace) -> Option<&mut Vec<Document>> {
        self.databases.get_mut(&ns.database)?.get_mut(&ns.collection)
    }

    pub fn list_databases(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }

    pub fn list_collections(&self, database: &str) -> Vec<String> {
        self.databases
            .get(database)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn find(&self, ns: &Namespace, query: &Query) -> Vec<Document> {
        self.collection(ns)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert_one(&mut self, ns: &Namespace, doc: Document) -> DocResult<Value> {
        let id = match doc.get("_id") {
            Some(id) => id.clone(),
            None => oid_value(ObjectId::new()),
        };
        let docs = self
            .databases
            .entry(ns.database.clone())
            .or_default()
            .entry(ns.collection.clone())
            .or_default();
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(DocError::DuplicateKey { id: id_text(&id) });
        }
        docs.push(with_id_first(id.clone(), doc));
        Ok(id)
    }

    pub fn replace_one(&mut self, ns: &Namespace, query: &Query, doc: Document) -> DocResult<bool> {
        let Some(docs) = self.collection_mut(ns) else {
            return Ok(false);
        };
        let Some(slot) = docs.iter_mut().find(|d| query.matches(d)) else {
            return Ok(false);
        };
        let original = slot.get("_id").cloned().unwrap_or(Value::Null);
        if let Some(replacement) = doc.get("_id") {
            if *replacement != original {
                return Err(DocError::ImmutableId {
                    original: id_text(&original),
                    replacement: id_text(replacement),
                });
            }
        }
        *slot = with_id_first(original, doc);
        Ok(true)
    }

    pub fn delete_one(&mut self, ns: &Namespace, query: &Query) -> bool {
        let Some(docs) = self.collection_mut(ns) else {
            return false;
        };
        match docs.iter().position(|d| query.matches(d)) {
            Some(index) => {
                docs.remove(index);
                true
            }
            None => false,
        }
    }
}

/// In-memory document store.
///
/// Intended for tests. The catalog sits behind a `RwLock`; documents are
/// cloned on read and write.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an existing catalog.
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    /// A copy of the current catalog.
    pub fn snapshot(&self) -> DocResult<Catalog> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> DocResult<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|e| DocError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> DocResult<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|e| DocError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn list_databases(&self) -> DocResult<Vec<String>> {
        Ok(self.read()?.list_databases())
    }

    fn list_collections(&self, database: &str) -> DocResult<Vec<String>> {
        Ok(self.read()?.list_collections(database))
    }

    fn find(&self, ns: &Namespace, query: &Query) -> DocResult<Vec<Document>> {
        Ok(self.read()?.find(ns, query))
    }

    fn insert_one(&self, ns: &Namespace, doc: Document) -> DocResult<Value> {
        let id = self.write()?.insert_one(ns, doc)?;
        debug!(%ns, id = %id, "document inserted");
        Ok(id)
    }

    fn replace_one(&self, ns: &Namespace, query: &Query, doc: Document) -> DocResult<bool> {
        let replaced = self.write()?.replace_one(ns, query, doc)?;
        debug!(%ns, replaced, "document replaced");
        Ok(replaced)
    }

    fn delete_one(&self, ns: &Namespace, query: &Query) -> DocResult<bool> {
        let deleted = self.write()?.delete_one(ns, query);
        debug!(%ns, deleted, "document deleted");
        Ok(deleted)
    }
}
