//! A [`DocumentStore`] persisted to a JSON snapshot file.

use std::fs;
use std::path::{Path, PathBuf};

use dbcli_editor::write_atomic;
use serde_json::Value;
use tracing::debug;

use crate::error::{DocError, DocResult};
use crate::extjson::Document;
use crate::filter::Query;
use crate::memory::{Catalog, InMemoryDocumentStore};
use crate::traits::{DocumentStore, Namespace};

/// File name of the document snapshot inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "documents.json";

/// Document store backed by a snapshot file, rewritten after each change.
#[derive(Debug)]
pub struct FileDocumentStore {
    path: PathBuf,
    inner: InMemoryDocumentStore,
}

impl FileDocumentStore {
    /// Open the snapshot at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> DocResult<Self> {
        let path = path.into();
        let catalog = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Catalog>(&bytes)
                .map_err(|e| DocError::Serialization(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Catalog::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), documents = catalog.document_count(), "opened document snapshot");
        Ok(Self {
            path,
            inner: InMemoryDocumentStore::from_catalog(catalog),
        })
    }

    /// Open the snapshot inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> DocResult<Self> {
        Self::open(data_dir.join(SNAPSHOT_FILE_NAME))
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> DocResult<()> {
        let catalog = self.inner.snapshot()?;
        let bytes = serde_json::to_vec_pretty(&catalog).map_err(|e| DocError::Serialization(e.to_string()))?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), "saved document snapshot");
        Ok(())
    }
}

impl DocumentStore for FileDocumentStore {
    fn list_databases(&self) -> DocResult<Vec<String>> {
        self.inner.list_databases()
    }

    fn list_collections(&self, database: &str) -> DocResult<Vec<String>> {
        self.inner.list_collections(database)
    }

    fn find(&self, ns: &Namespace, query: &Query) -> DocResult<Vec<Document>> {
        self.inner.find(ns, query)
    }

    fn insert_one(&self, ns: &Namespace, doc: Document) -> DocResult<Value> {
        let id = self.inner.insert_one(ns, doc)?;
        self.save()?;
        Ok(id)
    }

    fn replace_one(&self, ns: &Namespace, query: &Query, doc: Document) -> DocResult<bool> {
        let replaced = self.inner.replace_one(ns, query, doc)?;
        if replaced {
            self.save()?;
        }
        Ok(replaced)
    }

    fn delete_one(&self, ns: &Namespace, query: &Query) -> DocResult<bool> {
        let deleted = self.inner.delete_one(ns, query)?;
        if deleted {
            self.save()?;
        }
        Ok(deleted)
    }
}
