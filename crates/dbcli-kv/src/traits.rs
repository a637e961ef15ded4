//! The [`KeyValueStore`] trait and the batched write it accepts.
//!
//! Every command receives its store handle explicitly; nothing in this crate
//! reaches for a process-wide connection.

use crate::error::StoreResult;

/// Type name reported for a key that does not exist.
pub const TYPE_NONE: &str = "none";

/// Primitive operations of a typed key-value store.
///
/// Keys and values are byte strings. Reads of a missing key return an empty
/// result rather than an error; operations against a key holding another
/// value type fail with [`StoreError::WrongType`](crate::StoreError::WrongType).
pub trait KeyValueStore: Send + Sync {
    /// Keys matching a glob `pattern`, in sorted order.
    fn keys(&self, pattern: &str) -> StoreResult<Vec<Vec<u8>>>;

    /// The store's type name for the value at `key`, or `"none"`.
    fn key_type(&self, key: &[u8]) -> StoreResult<String>;

    /// Read a string-family value (string, bitmap or HyperLogLog bytes).
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Read list elements between `start` and `stop` inclusive.
    ///
    /// Negative indices count from the end, so `(0, -1)` reads everything.
    fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>>;

    /// All members of a set.
    fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>>;

    /// All field/value pairs of a hash.
    fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Sorted-set members with scores between ranks `start` and `stop`.
    fn zrange_with_scores(&self, key: &[u8], start: i64, stop: i64)
        -> StoreResult<Vec<(Vec<u8>, f64)>>;

    /// The bit at `offset` of a string-family value.
    fn getbit(&self, key: &[u8], offset: u64) -> StoreResult<bool>;

    /// Estimated number of distinct elements added to a HyperLogLog.
    fn pfcount(&self, key: &[u8]) -> StoreResult<u64>;

    /// Assign a string value, replacing whatever the key held.
    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Append values to a list. Returns the new length.
    fn rpush(&self, key: &[u8], values: &[Vec<u8>]) -> StoreResult<usize>;

    /// Add members to a set. Returns how many were not already present.
    fn sadd(&self, key: &[u8], members: &[Vec<u8>]) -> StoreResult<usize>;

    /// Set several hash fields at once.
    fn hset_multiple(&self, key: &[u8], fields: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()>;

    /// Add or update sorted-set members. Returns how many were new.
    fn zadd_multiple(&self, key: &[u8], members: &[(Vec<u8>, f64)]) -> StoreResult<usize>;

    /// Add elements to a HyperLogLog. Returns `true` if the estimate changed.
    fn pfadd(&self, key: &[u8], elements: &[Vec<u8>]) -> StoreResult<bool>;

    /// Set or clear one bit. Returns the previous bit.
    fn setbit(&self, key: &[u8], offset: u64, value: bool) -> StoreResult<bool>;

    /// Delete a key. Returns `true` if it existed.
    fn del(&self, key: &[u8]) -> StoreResult<bool>;

    /// Submit a batch of writes together.
    ///
    /// The default applies operations one by one and stops at the first
    /// failure. Backends that can apply a batch atomically override this.
    fn execute(&self, batch: &Batch) -> StoreResult<()> {
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => self.set(key, value)?,
                BatchOp::RPush { key, values } => {
                    self.rpush(key, values)?;
                }
                BatchOp::HSet { key, fields } => self.hset_multiple(key, fields)?,
            }
        }
        Ok(())
    }

    /// Returns `true` if `key` exists.
    fn exists(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.key_type(key)? != TYPE_NONE)
    }
}

/// One queued write in a [`Batch`].
#[derive(Clone, Debug, PartialEq)]
pub enum BatchOp {
    /// Assign a string value.
    Set { key: Vec<u8>, value: Vec<u8> },
    /// Append to a list.
    RPush { key: Vec<u8>, values: Vec<Vec<u8>> },
    /// Set hash fields.
    HSet {
        key: Vec<u8>,
        fields: Vec<(Vec<u8>, Vec<u8>)>,
    },
}

impl BatchOp {
    /// The key this operation writes.
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Set { key, .. } | BatchOp::RPush { key, .. } | BatchOp::HSet { key, .. } => {
                key
            }
        }
    }
}

/// Writes queued for submission in one round trip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a string assignment.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(BatchOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Queue a list append.
    pub fn rpush(&mut self, key: impl Into<Vec<u8>>, values: Vec<Vec<u8>>) -> &mut Self {
        self.ops.push(BatchOp::RPush {
            key: key.into(),
            values,
        });
        self
    }

    /// Queue a hash field assignment.
    pub fn hset(&mut self, key: impl Into<Vec<u8>>, fields: Vec<(Vec<u8>, Vec<u8>)>) -> &mut Self {
        self.ops.push(BatchOp::HSet {
            key: key.into(),
            fields,
        });
        self
    }

    /// Queued operations in submission order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
