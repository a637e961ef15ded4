//! Key-value side of the dbcli administration tools.
//!
//! Values in a typed key-value store carry no JSON type information of their
//! own: a list of numbers and a list of numeric strings read back the same.
//! This crate marshals between stored values and editable JSON by always
//! consulting the store's type name for a key and letting that tag direct
//! both decoding and encoding.
//!
//! # Modules
//!
//! - [`decode`] -- raw store values to JSON, all or nothing
//! - [`registry`] -- [`ValueTag`], canonical shapes, scaffolds, type resolution
//! - [`encode`] -- shape check and single-primitive write per tag
//! - [`session`] -- [`EditSession`] state machine and [`add_key`]
//! - [`batch`] -- bulk add of sniffed entries in one batch
//! - [`convert`] -- list to set and hash to sorted set
//! - [`render`] -- `show-db` lines and key listing
//! - [`glob`] -- key pattern matching
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`InMemoryKeyValueStore`] -- `BTreeMap` behind an `RwLock`, for tests
//! - [`FileKeyValueStore`] -- the in-memory store persisted to a JSON snapshot
//!
//! # Rules
//!
//! 1. Malformed JSON input never reaches the store.
//! 2. An edit is validated against the key's original type before the old
//!    value is deleted.
//! 3. Every command takes its store handle explicitly.

pub mod batch;
pub mod convert;
pub mod decode;
pub mod encode;
pub mod error;
pub mod file;
pub mod glob;
pub mod memory;
pub mod raw;
pub mod registry;
pub mod render;
pub mod session;
pub mod traits;

pub use batch::{add_data, run_add_data};
pub use convert::{to_set, to_zset};
pub use decode::decode;
pub use encode::{normalize, write, TypedValue};
pub use error::{DecodeError, KvError, KvResult, StoreError, StoreResult};
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use raw::RawValue;
pub use registry::{resolve_tag, scaffold_for, shape_for, CanonicalShape, ValueTag};
pub use render::{list_keys, show_db, show_value};
pub use session::{add_key, to_pretty_json, EditSession, SessionState};
pub use traits::{Batch, BatchOp, KeyValueStore};
