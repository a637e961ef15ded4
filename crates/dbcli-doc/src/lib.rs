//! Document side of the dbcli administration tools.
//!
//! Documents are ordered JSON objects in canonical extended JSON: object
//! ids as `{"$oid": ...}` and timestamps as `{"$date": ...}`. Commands show
//! them relaxed (plain hex and ISO-8601 text) and edit them canonical, so
//! typed values survive a trip through a text editor.
//!
//! # Modules
//!
//! - [`object_id`] -- 12-byte [`ObjectId`] with hex text form and timestamp
//! - [`extjson`] -- wrapper detection, relaxed rendering, document parsing
//! - [`filter`] -- [`Filter`] from `-i`/`-o` values and the equality [`Query`]
//! - [`flatten`] -- `a_b_0: value` lines
//! - [`ops`] -- list, show, add, edit and delete commands
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- catalog behind an `RwLock`, for tests
//! - [`FileDocumentStore`] -- the in-memory store persisted to a JSON snapshot

pub mod error;
pub mod extjson;
pub mod file;
pub mod filter;
pub mod flatten;
pub mod memory;
pub mod object_id;
pub mod ops;
pub mod traits;

pub use error::{DocError, DocResult};
pub use extjson::Document;
pub use file::FileDocumentStore;
pub use filter::{build as build_filter, Filter, Query};
pub use memory::{Catalog, InMemoryDocumentStore};
pub use object_id::ObjectId;
pub use ops::{add_document, delete_document, edit_document, list_documents, show_document};
pub use traits::{DocumentStore, Namespace};
