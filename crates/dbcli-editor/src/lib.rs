//! Text-editor integration for the dbcli administration tools.
//!
//! Both command-line clients use a text editor as their input surface for
//! structured data: a JSON seed is written to a temporary file, the operator
//! edits it, and the result is handed back for parsing. This crate hides that
//! round trip behind the [`Editor`] trait.
//!
//! # Implementations
//!
//! - [`ExternalEditor`] -- spawns `$VISUAL` / `$EDITOR` (or a configured
//!   command) in the foreground and reads the file back
//! - [`ScriptedEditor`] -- replays canned responses; used by tests and
//!   non-interactive callers
//!
//! An editor returns `Ok(None)` when the operator closed it without
//! producing content. That is a normal outcome, never an error; callers
//! report it as [`EditOutcome::Unchanged`].
//!
//! The [`snapshot`] module holds the atomic file write shared by the
//! snapshot-backed stores.

pub mod error;
pub mod external;
pub mod outcome;
pub mod scripted;
pub mod snapshot;
pub mod traits;

pub use error::{EditorError, Result};
pub use external::ExternalEditor;
pub use outcome::EditOutcome;
pub use scripted::ScriptedEditor;
pub use snapshot::write_atomic;
pub use traits::{EditOptions, Editor};
