//! In-memory key-value store for testing and ephemeral use.
//!
//! [`InMemoryKeyValueStore`] keeps a [`Keyspace`] behind a `RwLock` and
//! implements the full [`KeyValueStore`] trait, including atomic batches.
//! The file-backed store reuses the same keyspace for its snapshots.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::HLL_HEADER;
use crate::error::{StoreError, StoreResult};
use crate::glob::glob_match;
use crate::traits::{Batch, BatchOp, KeyValueStore, TYPE_NONE};

/// Marker byte after the HyperLogLog header; never valid UTF-8.
const HLL_MARKER: u8 = 0xff;

/// Highest addressable bit offset (values are capped at 512 MiB).
const MAX_BIT_OFFSET: u64 = (1 << 32) - 1;

/// A value held at one key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    /// A plain byte string.
    String(Vec<u8>),
    /// A byte string last written through bit operations.
    Bitmap(Vec<u8>),
    /// Hashes of the distinct elements added to a HyperLogLog.
    HyperLogLog(BTreeSet<u64>),
    /// An ordered list.
    List(Vec<Vec<u8>>),
    /// Field/value pairs, sorted by field and unique.
    Hash(Vec<(Vec<u8>, Vec<u8>)>),
    /// Distinct members.
    Set(BTreeSet<Vec<u8>>),
    /// Members with scores, sorted by (score, member).
    SortedSet(Vec<(Vec<u8>, f64)>),
}

impl StoredValue {
    /// The store type name reported by `key_type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            StoredValue::String(_) => "string",
            StoredValue::Bitmap(_) => "bitmap",
            StoredValue::HyperLogLog(_) => "hyperloglog",
            StoredValue::List(_) => "list",
            StoredValue::Hash(_) => "hash",
            StoredValue::Set(_) => "set",
            StoredValue::SortedSet(_) => "zset",
        }
    }

    /// Serialized form of a HyperLogLog: header, marker, then hashes.
    fn sketch_bytes(hashes: &BTreeSet<u64>) -> Vec<u8> {
        let mut out = Vec::with_capacity(HLL_HEADER.len() + 1 + hashes.len() * 8);
        out.extend_from_slice(HLL_HEADER);
        out.push(HLL_MARKER);
        for h in hashes {
            out.extend_from_slice(&h.to_be_bytes());
        }
        out
    }
}

/// All keys of one logical database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keyspace {
    entries: BTreeMap<Vec<u8>, StoredValue>,
}

/// Serialized form of a [`Keyspace`]; JSON maps cannot have byte keys.
#[derive(Serialize, Deserialize)]
struct KeyspaceEntry {
    key: Vec<u8>,
    value: StoredValue,
}

impl Serialize for Keyspace {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|(key, value)| KeyspaceEntryRef { key, value }))
    }
}

#[derive(Serialize)]
struct KeyspaceEntryRef<'a> {
    key: &'a Vec<u8>,
    value: &'a StoredValue,
}

impl<'de> Deserialize<'de> for Keyspace {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<KeyspaceEntry>::deserialize(deserializer)?;
        Ok(Self {
            entries: entries.into_iter().map(|e| (e.key, e.value)).collect(),
        })
    }
}

fn wrong_type(key: &[u8], value: &StoredValue) -> StoreError {
    StoreError::WrongType {
        key: String::from_utf8_lossy(key).into_owned(),
        actual: value.type_name().to_string(),
    }
}

fn require_args<T>(items: &[T], op: &str) -> StoreResult<()> {
    if items.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "{op} requires at least one element"
        )));
    }
    Ok(())
}

/// Resolve an inclusive index range with negative-from-end semantics.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// FNV-1a, used to fingerprint HyperLogLog elements.
fn fingerprint(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

fn sort_scored(members: &mut [(Vec<u8>, f64)]) {
    members.sort_by(|(am, a), (bm, b)| a.total_cmp(b).then_with(|| am.cmp(bm)));
}

impl Keyspace {
    /// Create an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value at `key`, if any.
    pub fn value(&self, key: &[u8]) -> Option<&StoredValue> {
        self.entries.get(key)
    }

    pub fn keys(&self, pattern: &str) -> Vec<Vec<u8>> {
        self.entries
            .keys()
            .filter(|k| glob_match(pattern.as_bytes(), k))
            .cloned()
            .collect()
    }

    pub fn key_type(&self, key: &[u8]) -> &'static str {
        self.entries.get(key).map_or(TYPE_NONE, StoredValue::type_name)
    }

    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(StoredValue::String(b)) | Some(StoredValue::Bitmap(b)) => Ok(Some(b.clone())),
            Some(StoredValue::HyperLogLog(h)) => Ok(Some(StoredValue::sketch_bytes(h))),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(StoredValue::List(items)) => Ok(resolve_range(items.len(), start, stop)
                .map(|(s, e)| items[s..=e].to_vec())
                .unwrap_or_default()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    pub fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(StoredValue::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    pub fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(StoredValue::Hash(fields)) => Ok(fields.clone()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    pub fn zrange_with_scores(
        &self,
        key: &[u8],
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<(Vec<u8>, f64)>> {
        match self.entries.get(key) {
            None => Ok(Vec::new()),
            Some(StoredValue::SortedSet(members)) => Ok(resolve_range(members.len(), start, stop)
                .map(|(s, e)| members[s..=e].to_vec())
                .unwrap_or_default()),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    pub fn getbit(&self, key: &[u8], offset: u64) -> StoreResult<bool> {
        let bytes = match self.entries.get(key) {
            None => return Ok(false),
            Some(StoredValue::String(b)) | Some(StoredValue::Bitmap(b)) => b,
            Some(other) => return Err(wrong_type(key, other)),
        };
        let index = (offset / 8) as usize;
        let mask = 0x80u8 >> (offset % 8);
        Ok(bytes.get(index).is_some_and(|b| b & mask != 0))
    }

    pub fn pfcount(&self, key: &[u8]) -> StoreResult<u64> {
        match self.entries.get(key) {
            None => Ok(0),
            Some(StoredValue::HyperLogLog(h)) => Ok(h.len() as u64),
            Some(other) => Err(wrong_type(key, other)),
        }
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        self.entries
            .insert(key.to_vec(), StoredValue::String(value.to_vec()));
    }

    pub fn rpush(&mut self, key: &[u8], values: &[Vec<u8>]) -> StoreResult<usize> {
        require_args(values, "rpush")?;
        let slot = self
            .entries
            .entry(key.to_vec())
            .or_insert_with(|| StoredValue::List(Vec::new()));
        match slot {
            StoredValue::List(items) => {
                items.extend(values.iter().cloned());
                Ok(items.len())
            }
            other => Err(wrong_type(key, other)),
        }
    }

    pub fn sadd(&mut self, key: &[u8], members: &[Vec<u8>]) -> StoreResult<usize> {
        require_args(members, "sadd")?;
        let slot = self
            .entries
            .entry(key.to_vec())
            .or_insert_with(|| StoredValue::Set(BTreeSet::new()));
        match slot {
            StoredValue::Set(set) => Ok(members.iter().filter(|m| set.insert((*m).clone())).count()),
            other => Err(wrong_type(key, other)),
        }
    }

    pub fn hset_multiple(&mut self, key: &[u8], fields: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()> {
        require_args(fields, "hset")?;
        let slot = self
            .entries
            .entry(key.to_vec())
            .or_insert_with(|| StoredValue::Hash(Vec::new()));
        match slot {
            StoredValue::Hash(existing) => {
                for (field, value) in fields {
                    match existing.binary_search_by(|(f, _)| f.cmp(field)) {
                        Ok(i) => existing[i].1 = value.clone(),
                        Err(i) => existing.insert(i, (field.clone(), value.clone())),
                    }
                }
                Ok(())
            }
            other => Err(wrong_type(key, other)),
        }
    }

    pub fn zadd_multiple(&mut self, key: &[u8], members: &[(Vec<u8>, f64)]) -> StoreResult<usize> {
        require_args(members, "zadd")?;
        if let Some((member, score)) = members.iter().find(|(_, s)| !s.is_finite()) {
            return Err(StoreError::InvalidArgument(format!(
                "score {score} for member {} is not a finite number",
                String::from_utf8_lossy(member)
            )));
        }
        let slot = self
            .entries
            .entry(key.to_vec())
            .or_insert_with(|| StoredValue::SortedSet(Vec::new()));
        match slot {
            StoredValue::SortedSet(existing) => {
                let mut scores: BTreeMap<Vec<u8>, f64> = existing.drain(..).collect();
                let before = scores.len();
                for (member, score) in members {
                    scores.insert(member.clone(), *score);
                }
                let added = scores.len() - before;
                existing.extend(scores);
                sort_scored(existing);
                Ok(added)
            }
            other => Err(wrong_type(key, other)),
        }
    }

    pub fn pfadd(&mut self, key: &[u8], elements: &[Vec<u8>]) -> StoreResult<bool> {
        match self.entries.entry(key.to_vec()) {
            Entry::Vacant(slot) => {
                slot.insert(StoredValue::HyperLogLog(
                    elements.iter().map(|e| fingerprint(e)).collect(),
                ));
                Ok(true)
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                StoredValue::HyperLogLog(hashes) => {
                    let before = hashes.len();
                    hashes.extend(elements.iter().map(|e| fingerprint(e)));
                    Ok(hashes.len() != before)
                }
                other => Err(wrong_type(key, other)),
            },
        }
    }

    pub fn setbit(&mut self, key: &[u8], offset: u64, value: bool) -> StoreResult<bool> {
        if offset > MAX_BIT_OFFSET {
            return Err(StoreError::InvalidArgument(format!(
                "bit offset {offset} is out of range"
            )));
        }
        let slot = self
            .entries
            .entry(key.to_vec())
            .or_insert_with(|| StoredValue::Bitmap(Vec::new()));
        if let StoredValue::String(bytes) = slot {
            *slot = StoredValue::Bitmap(std::mem::take(bytes));
        }
        let bytes = match slot {
            StoredValue::Bitmap(bytes) => bytes,
            other => return Err(wrong_type(key, other)),
        };
        let index = (offset / 8) as usize;
        if bytes.len() <= index {
            bytes.resize(index + 1, 0);
        }
        let mask = 0x80u8 >> (offset % 8);
        let previous = bytes[index] & mask != 0;
        if value {
            bytes[index] |= mask;
        } else {
            bytes[index] &= !mask;
        }
        Ok(previous)
    }

    pub fn del(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Apply every operation of `batch`, or none of them.
    ///
    /// Operations run against a scratch copy that replaces the live entries
    /// only when all of them succeed.
    pub fn apply_batch(&mut self, batch: &Batch) -> StoreResult<()> {
        let mut scratch = self.clone();
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => scratch.set(key, value),
                BatchOp::RPush { key, values } => {
                    scratch.rpush(key, values)?;
                }
                BatchOp::HSet { key, fields } => scratch.hset_multiple(key, fields)?,
            }
        }
        *self = scratch;
        Ok(())
    }
}

/// An in-memory implementation of [`KeyValueStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    keyspace: RwLock<Keyspace>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an existing keyspace.
    pub fn from_keyspace(keyspace: Keyspace) -> Self {
        Self {
            keyspace: RwLock::new(keyspace),
        }
    }

    /// A copy of the current keyspace.
    pub fn snapshot(&self) -> StoreResult<Keyspace> {
        Ok(self.read()?.clone())
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keyspace.read().map_or(0, |ks| ks.len())
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Keyspace>> {
        self.keyspace
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Keyspace>> {
        self.keyspace
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn keys(&self, pattern: &str) -> StoreResult<Vec<Vec<u8>>> {
        Ok(self.read()?.keys(pattern))
    }

    fn key_type(&self, key: &[u8]) -> StoreResult<String> {
        Ok(self.read()?.key_type(key).to_string())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.read()?.get(key)
    }

    fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>> {
        self.read()?.lrange(key, start, stop)
    }

    fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
        self.read()?.smembers(key)
    }

    fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.read()?.hgetall(key)
    }

    fn zrange_with_scores(
        &self,
        key: &[u8],
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<(Vec<u8>, f64)>> {
        self.read()?.zrange_with_scores(key, start, stop)
    }

    fn getbit(&self, key: &[u8], offset: u64) -> StoreResult<bool> {
        self.read()?.getbit(key, offset)
    }

    fn pfcount(&self, key: &[u8]) -> StoreResult<u64> {
        self.read()?.pfcount(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.write()?.set(key, value);
        debug!(key = %String::from_utf8_lossy(key), "set");
        Ok(())
    }

    fn rpush(&self, key: &[u8], values: &[Vec<u8>]) -> StoreResult<usize> {
        let len = self.write()?.rpush(key, values)?;
        debug!(key = %String::from_utf8_lossy(key), count = values.len(), "rpush");
        Ok(len)
    }

    fn sadd(&self, key: &[u8], members: &[Vec<u8>]) -> StoreResult<usize> {
        let added = self.write()?.sadd(key, members)?;
        debug!(key = %String::from_utf8_lossy(key), added, "sadd");
        Ok(added)
    }

    fn hset_multiple(&self, key: &[u8], fields: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()> {
        self.write()?.hset_multiple(key, fields)?;
        debug!(key = %String::from_utf8_lossy(key), count = fields.len(), "hset");
        Ok(())
    }

    fn zadd_multiple(&self, key: &[u8], members: &[(Vec<u8>, f64)]) -> StoreResult<usize> {
        let added = self.write()?.zadd_multiple(key, members)?;
        debug!(key = %String::from_utf8_lossy(key), added, "zadd");
        Ok(added)
    }

    fn pfadd(&self, key: &[u8], elements: &[Vec<u8>]) -> StoreResult<bool> {
        let changed = self.write()?.pfadd(key, elements)?;
        debug!(key = %String::from_utf8_lossy(key), changed, "pfadd");
        Ok(changed)
    }

    fn setbit(&self, key: &[u8], offset: u64, value: bool) -> StoreResult<bool> {
        let previous = self.write()?.setbit(key, offset, value)?;
        debug!(key = %String::from_utf8_lossy(key), offset, value, "setbit");
        Ok(previous)
    }

    fn del(&self, key: &[u8]) -> StoreResult<bool> {
        let existed = self.write()?.del(key);
        debug!(key = %String::from_utf8_lossy(key), existed, "del");
        Ok(existed)
    }

    fn execute(&self, batch: &Batch) -> StoreResult<()> {
        self.write()?.apply_batch(batch)?;
        debug!(ops = batch.len(), "batch applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn missing_key_reads_empty() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.key_type(b"nope").unwrap(), "none");
        assert_eq!(store.get(b"nope").unwrap(), None);
        assert!(store.lrange(b"nope", 0, -1).unwrap().is_empty());
        assert!(store.hgetall(b"nope").unwrap().is_empty());
        assert!(!store.exists(b"nope").unwrap());
    }

    #[test]
    fn set_overwrites_any_type() {
        let store = InMemoryKeyValueStore::new();
        store.rpush(b"k", &[b("a")]).unwrap();
        store.set(b"k", b"plain").unwrap();
        assert_eq!(store.key_type(b"k").unwrap(), "string");
        assert_eq!(store.get(b"k").unwrap(), Some(b("plain")));
    }

    #[test]
    fn list_ranges_follow_negative_indices() {
        let store = InMemoryKeyValueStore::new();
        store.rpush(b"l", &[b("a"), b("b"), b("c"), b("d")]).unwrap();
        assert_eq!(store.lrange(b"l", 0, -1).unwrap().len(), 4);
        assert_eq!(store.lrange(b"l", 1, 2).unwrap(), vec![b("b"), b("c")]);
        assert_eq!(store.lrange(b"l", -2, -1).unwrap(), vec![b("c"), b("d")]);
        assert_eq!(store.lrange(b"l", 0, 100).unwrap().len(), 4);
        assert!(store.lrange(b"l", 3, 1).unwrap().is_empty());
    }

    #[test]
    fn wrong_type_is_reported() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"s", b"v").unwrap();
        let err = store.rpush(b"s", &[b("x")]).unwrap_err();
        assert!(matches!(err, StoreError::WrongType { ref actual, .. } if actual == "string"));
        assert!(store.hgetall(b"s").is_err());
    }

    #[test]
    fn empty_collection_writes_are_rejected() {
        let store = InMemoryKeyValueStore::new();
        assert!(matches!(
            store.rpush(b"l", &[]).unwrap_err(),
            StoreError::InvalidArgument(_)
        ));
        assert!(!store.exists(b"l").unwrap());
    }

    #[test]
    fn sets_deduplicate() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.sadd(b"s", &[b("x"), b("y"), b("x")]).unwrap(), 2);
        assert_eq!(store.sadd(b"s", &[b("y")]).unwrap(), 0);
        assert_eq!(store.smembers(b"s").unwrap(), vec![b("x"), b("y")]);
    }

    #[test]
    fn hash_fields_upsert() {
        let store = InMemoryKeyValueStore::new();
        store.hset_multiple(b"h", &[(b("b"), b("1")), (b("a"), b("2"))]).unwrap();
        store.hset_multiple(b"h", &[(b("b"), b("3"))]).unwrap();
        assert_eq!(
            store.hgetall(b"h").unwrap(),
            vec![(b("a"), b("2")), (b("b"), b("3"))]
        );
    }

    #[test]
    fn sorted_set_orders_by_score() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.zadd_multiple(b"z", &[(b("hi"), 3.0), (b("lo"), 1.0)]).unwrap(), 2);
        assert_eq!(store.zadd_multiple(b"z", &[(b("hi"), 0.5)]).unwrap(), 0);
        assert_eq!(
            store.zrange_with_scores(b"z", 0, -1).unwrap(),
            vec![(b("hi"), 0.5), (b("lo"), 1.0)]
        );
        assert!(store.zadd_multiple(b"z", &[(b("x"), f64::NAN)]).is_err());
    }

    #[test]
    fn large_sorted_set_writes_count_new_members_once() {
        let store = InMemoryKeyValueStore::new();
        let members: Vec<(Vec<u8>, f64)> = (0..50_000u32)
            .map(|i| (i.to_be_bytes().to_vec(), f64::from(i % 7)))
            .collect();
        assert_eq!(store.zadd_multiple(b"z", &members).unwrap(), 50_000);
        assert_eq!(store.zadd_multiple(b"z", &members).unwrap(), 0);
        let repeated = [(b("dup"), 1.0), (b("dup"), 2.0)];
        assert_eq!(store.zadd_multiple(b"z", &repeated).unwrap(), 1);
        let all = store.zrange_with_scores(b"z", 0, -1).unwrap();
        assert_eq!(all.len(), 50_001);
        assert!(all.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(all.contains(&(b("dup"), 2.0)));
    }

    #[test]
    fn bits_are_msb_first() {
        let store = InMemoryKeyValueStore::new();
        assert!(!store.setbit(b"bits", 1, true).unwrap());
        assert_eq!(store.key_type(b"bits").unwrap(), "bitmap");
        assert_eq!(store.get(b"bits").unwrap(), Some(vec![0x40]));
        assert!(store.getbit(b"bits", 1).unwrap());
        assert!(!store.getbit(b"bits", 0).unwrap());
        assert!(!store.getbit(b"bits", 999).unwrap());
        assert!(store.setbit(b"bits", 1, false).unwrap());
        assert_eq!(store.get(b"bits").unwrap(), Some(vec![0x00]));
    }

    #[test]
    fn setbit_turns_string_into_bitmap() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"k", b"@").unwrap();
        store.setbit(b"k", 7, true).unwrap();
        assert_eq!(store.key_type(b"k").unwrap(), "bitmap");
        assert_eq!(store.get(b"k").unwrap(), Some(vec![0x41]));
    }

    #[test]
    fn hyperloglog_counts_distinct_and_is_binary() {
        let store = InMemoryKeyValueStore::new();
        assert!(store.pfadd(b"h", &[b("1"), b("2"), b("2")]).unwrap());
        assert!(!store.pfadd(b"h", &[b("1")]).unwrap());
        assert_eq!(store.pfcount(b"h").unwrap(), 2);
        let raw = store.get(b"h").unwrap().unwrap();
        assert!(raw.starts_with(HLL_HEADER));
        assert!(std::str::from_utf8(&raw).is_err());
    }

    #[test]
    fn keys_match_glob_in_order() {
        let store = InMemoryKeyValueStore::new();
        for k in ["user:2", "user:1", "session:1"] {
            store.set(k.as_bytes(), b"v").unwrap();
        }
        assert_eq!(store.keys("user:*").unwrap(), vec![b("user:1"), b("user:2")]);
        assert_eq!(store.keys("*").unwrap().len(), 3);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"taken", b"string").unwrap();

        let mut batch = Batch::new();
        batch.set("a", "1").rpush("taken", vec![b("x")]);
        assert!(store.execute(&batch).is_err());
        assert!(!store.exists(b"a").unwrap());

        let mut batch = Batch::new();
        batch
            .set("a", "1")
            .rpush("l", vec![b("x"), b("y")])
            .hset("h", vec![(b("f"), b("v"))]);
        store.execute(&batch).unwrap();
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn keyspace_serde_roundtrip() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"s", b"v").unwrap();
        store.hset_multiple(b"h", &[(b("f"), b("v"))]).unwrap();
        store.zadd_multiple(b"z", &[(b("m"), 1.5)]).unwrap();
        store.pfadd(b"p", &[b("x")]).unwrap();
        let snapshot = store.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Keyspace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
