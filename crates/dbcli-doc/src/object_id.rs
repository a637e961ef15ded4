use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{DocError, DocResult};

/// Largest value of the 3-byte counter segment.
const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Identifier generated by the document store for new documents.
///
/// Twelve bytes: a 4-byte big-endian creation time in seconds, 5 bytes of
/// per-process randomness and a 3-byte big-endian counter. Ids generated
/// by one process sort by creation time, then by counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

fn process_unique() -> &'static [u8; 5] {
    static UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    UNIQUE.get_or_init(rand::random)
}

fn next_count() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
        .fetch_add(1, Ordering::SeqCst)
        & COUNTER_MASK
}

impl ObjectId {
    /// Generate a fresh id stamped with the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Generate a fresh id stamped with `time` (truncated to seconds).
    pub fn at(time: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; 12];
        let seconds = u32::try_from(time.timestamp().max(0)).unwrap_or(u32::MAX);
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&next_count().to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Build an id from its raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// The raw 12 bytes.
    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Lowercase 24-character hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 24-character hex form.
    pub fn parse_str(s: &str) -> DocResult<Self> {
        let invalid = |reason: String| DocError::InvalidObjectId {
            value: s.to_string(),
            reason,
        };
        if s.len() != 24 {
            return Err(invalid(format!("expected 24 hex characters, got {}", s.len())));
        }
        let bytes = hex::decode(s).map_err(|e| invalid(e.to_string()))?;
        let mut arr = [0u8; 12];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// When the id was generated, to the second.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(seconds), 0)
            .single()
            .unwrap_or_default()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}
