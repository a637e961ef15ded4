//! Error types for document store operations.

use thiserror::Error;

/// Errors that can occur in document commands and store backends.
#[derive(Debug, Error)]
pub enum DocError {
    /// Neither a plain id nor an object id was given.
    #[error("either a document id (-i) or an object id (-o) must be given")]
    MissingIdentifier,

    /// Both a plain id and an object id were given.
    #[error("give either a document id (-i) or an object id (-o), not both")]
    ConflictingIdentifiers,

    /// Text that should be an object id is not 24 hex characters.
    #[error("invalid object id {value:?}: {reason}")]
    InvalidObjectId { value: String, reason: String },

    /// No document matches the filter.
    #[error("no document with this id or object id")]
    DocumentNotFound,

    /// The command needs a database and/or collection name.
    #[error("{0}")]
    MissingNamespace(&'static str),

    /// A document with the same `_id` already exists.
    #[error("duplicate key: a document with _id {id} already exists")]
    DuplicateKey { id: String },

    /// A replacement tried to change the document's `_id`.
    #[error("the _id of a document cannot be changed (was {original}, got {replacement})")]
    ImmutableId { original: String, replacement: String },

    /// Input parsed as JSON but is not a document.
    #[error("not a document: {0}")]
    NotADocument(String),

    /// A filter was not valid JSON.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The backend is not able to serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the editor round trip.
    #[error("editor error: {0}")]
    Editor(#[from] dbcli_editor::EditorError),
}

/// Convenience type alias for document operations.
pub type DocResult<T> = std::result::Result<T, DocError>;
