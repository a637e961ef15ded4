//! Error types for editor round trips.

use thiserror::Error;

/// Errors that can occur while running an editor.
#[derive(Debug, Error)]
pub enum EditorError {
    /// No editor command could be determined.
    #[error("no editor command configured")]
    NoCommand,

    /// The editor process could not be started.
    #[error("failed to launch editor `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The editor exited with a failure status.
    #[error("editor `{command}` failed: {status}")]
    Failed { command: String, status: String },

    /// I/O error on the temporary buffer file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
