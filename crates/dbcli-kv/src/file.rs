//! A [`KeyValueStore`] persisted to a JSON snapshot file.
//!
//! The whole keyspace lives in memory and is rewritten after every
//! successful mutation: serialize, write a temp file next to the target,
//! fsync, then rename over the old snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use dbcli_editor::write_atomic;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::{InMemoryKeyValueStore, Keyspace};
use crate::traits::{Batch, KeyValueStore};

/// File name of the snapshot for logical database `db`.
pub fn snapshot_file_name(db: u32) -> String {
    format!("kv-{db}.json")
}

/// Key-value store backed by a snapshot file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    inner: InMemoryKeyValueStore,
}

impl FileKeyValueStore {
    /// Open the snapshot at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let keyspace = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Keyspace>(&bytes).map_err(|e| {
                StoreError::Serialization(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Keyspace::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = keyspace.len(), "opened key-value snapshot");
        Ok(Self {
            path,
            inner: InMemoryKeyValueStore::from_keyspace(keyspace),
        })
    }

    /// Open database `db` under `data_dir`.
    pub fn open_in(data_dir: &Path, db: u32) -> StoreResult<Self> {
        Self::open(data_dir.join(snapshot_file_name(db)))
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> StoreResult<()> {
        let keyspace = self.inner.snapshot()?;
        let bytes = serde_json::to_vec_pretty(&keyspace).map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), keys = keyspace.len(), "saved key-value snapshot");
        Ok(())
    }

    fn saved<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        let value = result?;
        self.save()?;
        Ok(value)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn keys(&self, pattern: &str) -> StoreResult<Vec<Vec<u8>>> {
        self.inner.keys(pattern)
    }

    fn key_type(&self, key: &[u8]) -> StoreResult<String> {
        self.inner.key_type(key)
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>> {
        self.inner.lrange(key, start, stop)
    }

    fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        self.inner.smembers(key)
    }

    fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.inner.hgetall(key)
    }

    fn zrange_with_scores(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<(Vec<u8>, f64)>> {
        self.inner.zrange_with_scores(key, start, stop)
    }

    fn getbit(&self, key: &[u8], offset: u64) -> StoreResult<bool> {
        self.inner.getbit(key, offset)
    }

    fn pfcount(&self, key: &[u8]) -> StoreResult<u64> {
        self.inner.pfcount(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.saved(self.inner.set(key, value))
    }

    fn rpush(&self, key: &[u8], values: &[Vec<u8>]) -> StoreResult<usize> {
        self.saved(self.inner.rpush(key, values))
    }

    fn sadd(&self, key: &[u8], members: &[Vec<u8>]) -> StoreResult<usize> {
        self.saved(self.inner.sadd(key, members))
    }

    fn hset_multiple(&self, key: &[u8], fields: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()> {
        self.saved(self.inner.hset_multiple(key, fields))
    }

    fn zadd_multiple(&self, key: &[u8], members: &[(Vec<u8>, f64)]) -> StoreResult<usize> {
        self.saved(self.inner.zadd_multiple(key, members))
    }

    fn pfadd(&self, key: &[u8], elements: &[Vec<u8>]) -> StoreResult<bool> {
        self.saved(self.inner.pfadd(key, elements))
    }

    fn setbit(&self, key: &[u8], offset: u64, value: bool) -> StoreResult<bool> {
        self.saved(self.inner.setbit(key, offset, value))
    }

    fn del(&self, key: &[u8]) -> StoreResult<bool> {
        let existed = self.inner.del(key)?;
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    fn execute(&self, batch: &Batch) -> StoreResult<()> {
        self.saved(self.inner.execute(batch))
    }
}
