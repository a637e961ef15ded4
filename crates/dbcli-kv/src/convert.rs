//! In-place type conversions: list to set and hash to sorted set.
//!
//! Both read the whole value, delete the key and write the converted value.
//! Input is validated before the delete. If the write fails afterwards the
//! original value is written back.

use tracing::{info, warn};

use crate::error::{KvError, KvResult, StoreError};
use crate::registry::{resolve_tag, shape_for, ValueTag};
use crate::traits::KeyValueStore;

fn require_tag<S: KeyValueStore + ?Sized>(store: &S, key: &str, expected: ValueTag) -> KvResult<()> {
    let actual = resolve_tag(store, key)?;
    if actual != expected {
        return Err(KvError::WrongType {
            key: key.to_string(),
            expected,
            actual: actual.store_type_name().to_string(),
        });
    }
    Ok(())
}

fn settle(
    key: &str,
    target: ValueTag,
    source: StoreError,
    restored: Result<(), StoreError>,
) -> KvError {
    match restored {
        Ok(()) => {
            warn!(key, %target, error = %source, "conversion failed, original restored");
            KvError::ConversionFailed {
                key: key.to_string(),
                target,
                source,
            }
        }
        Err(restore_error) => {
            warn!(key, %target, error = %source, %restore_error, "conversion failed, restore failed");
            KvError::ConversionLost {
                key: key.to_string(),
                target,
                source,
            }
        }
    }
}

/// Convert a list into a set of its distinct elements.
///
/// Returns the number of members in the resulting set.
pub fn to_set<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> KvResult<usize> {
    require_tag(store, key, ValueTag::List)?;
    let items = store.lrange(key.as_bytes(), 0, -1)?;
    store.del(key.as_bytes())?;
    match store.sadd(key.as_bytes(), &items) {
        Ok(added) => {
            info!(key, members = added, "list converted to set");
            Ok(added)
        }
        Err(source) => {
            let restored = store.del(key.as_bytes()).and_then(|_| store.rpush(key.as_bytes(), &items).map(drop));
            Err(settle(key, ValueTag::Set, source, restored))
        }
    }
}

/// Convert a hash of numeric values into a sorted set scored by them.
///
/// Every value must parse as a float; otherwise the hash is left untouched.
pub fn to_zset<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> KvResult<usize> {
    require_tag(store, key, ValueTag::Hash)?;
    let fields = store.hgetall(key.as_bytes())?;
    let members = fields
        .iter()
        .map(|(field, value)| {
            let score = std::str::from_utf8(value)
                .ok()
                .and_then(|text| text.trim().parse::<f64>().ok())
                .filter(|score| !score.is_nan());
            match score {
                Some(score) => Ok((field.clone(), score)),
                None => Err(KvError::MalformedValue {
                    tag: ValueTag::SortedSet,
                    expected: shape_for(ValueTag::SortedSet),
                    detail: format!(
                        "value of field {:?} is not a number: {:?}",
                        String::from_utf8_lossy(field),
                        String::from_utf8_lossy(value)
                    ),
                }),
            }
        })
        .collect::<KvResult<Vec<_>>>()?;

    store.del(key.as_bytes())?;
    match store.zadd_multiple(key.as_bytes(), &members) {
        Ok(added) => {
            info!(key, members = added, "hash converted to sorted set");
            Ok(added)
        }
        Err(source) => {
            let restored = store
                .del(key.as_bytes())
                .and_then(|_| store.hset_multiple(key.as_bytes(), &fields));
            Err(settle(key, ValueTag::SortedSet, source, restored))
        }
    }
}
