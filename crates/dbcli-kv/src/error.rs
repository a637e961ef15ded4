//! Error types for key-value operations.
//!
//! [`StoreError`] covers failures reported by a store backend. [`KvError`] is
//! the user-facing taxonomy of the marshalling layer and wraps store errors.

use thiserror::Error;

use crate::registry::{CanonicalShape, ValueTag};

/// Errors reported by a [`KeyValueStore`](crate::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation does not apply to the kind of value held at the key.
    #[error("WRONGTYPE operation against key {key} holding a {actual} value")]
    WrongType { key: String, actual: String },

    /// A primitive was called with an argument it cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend is not able to serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store backend operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure to turn a raw store value into editable text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The value is a binary-opaque encoding (a HyperLogLog sketch).
    #[error("value is a binary HyperLogLog sketch")]
    Opaque,

    /// A byte string is not valid UTF-8.
    #[error("byte string is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidText { valid_up_to: usize },

    /// A mapping key did not decode to text.
    #[error("mapping key is not a text value")]
    NonTextKey,
}

/// Errors surfaced to the operator by key-value commands.
#[derive(Debug, Error)]
pub enum KvError {
    /// The key does not exist.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// The store reported a type the tools do not handle.
    #[error("unsupported value type: {type_name}")]
    UnsupportedType { type_name: String },

    /// The value exists but cannot be presented as editable JSON.
    #[error("value in key {key} cannot be edited: {reason}")]
    NotEditable { key: String, reason: String },

    /// JSON input does not have the shape the value type requires.
    #[error("malformed {tag} value: expected {expected}: {detail}")]
    MalformedValue {
        tag: ValueTag,
        expected: CanonicalShape,
        detail: String,
    },

    /// An edited document must name exactly one key.
    #[error("edited document must be an object with exactly one key, found {found}")]
    AmbiguousKey { found: usize },

    /// The old key was deleted but the replacement write failed.
    #[error(
        "key {original} was deleted but writing {key} failed: {source}; \
         the store no longer holds this value, recreate it manually"
    )]
    CommitFailed {
        original: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The key holds a different type than the command requires.
    #[error("wrong key type for {key}: expected {expected}, found {actual}")]
    WrongType {
        key: String,
        expected: ValueTag,
        actual: String,
    },

    /// A type conversion failed and the original value was put back.
    #[error("converting {key} to {target} failed: {source}; original value restored")]
    ConversionFailed {
        key: String,
        target: ValueTag,
        #[source]
        source: StoreError,
    },

    /// A type conversion failed and putting the original value back failed too.
    #[error(
        "converting {key} to {target} failed and the original value could not be \
         restored: {source}; recreate the key manually"
    )]
    ConversionLost {
        key: String,
        target: ValueTag,
        #[source]
        source: StoreError,
    },

    /// Error from the underlying store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the editor round trip.
    #[error("editor error: {0}")]
    Editor(#[from] dbcli_editor::EditorError),
}

/// Convenience type alias for key-value operations.
pub type KvResult<T> = std::result::Result<T, KvError>;
