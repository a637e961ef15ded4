//! Editor backed by an external process.

use std::fs;
use std::io::Write;
use std::process::Command;

use tracing::debug;

use crate::error::{EditorError, Result};
use crate::traits::{EditOptions, Editor};

/// Fallback when neither `$VISUAL` nor `$EDITOR` is set.
const DEFAULT_EDITOR: &str = "vi";

/// Runs an external editor command on a temporary file.
///
/// The command string is split on whitespace, so `"code --wait"` works;
/// the buffer path is appended as the final argument.
#[derive(Clone, Debug)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    /// Use an explicit editor command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Resolve the editor from `$VISUAL`, then `$EDITOR`, then `vi`.
    pub fn from_env() -> Self {
        let command = ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self::new(command)
    }

    /// Use `command` when given, otherwise fall back to [`from_env`](Self::from_env).
    pub fn resolve(command: Option<&str>) -> Self {
        match command {
            Some(cmd) if !cmd.trim().is_empty() => Self::new(cmd),
            _ => Self::from_env(),
        }
    }

    /// The command this editor runs.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, seed: &str, options: &EditOptions) -> Result<Option<String>> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or(EditorError::NoCommand)?;

        let mut buffer = tempfile::Builder::new()
            .prefix("dbcli-")
            .suffix(&options.extension)
            .tempfile()?;
        buffer.write_all(seed.as_bytes())?;
        buffer.flush()?;
        let before = fs::metadata(buffer.path())?.modified()?;

        debug!(command = %self.command, path = %buffer.path().display(), "launching editor");
        let status = Command::new(program)
            .args(parts)
            .arg(buffer.path())
            .status()
            .map_err(|source| EditorError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !status.success() {
            return Err(EditorError::Failed {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }

        let after = fs::metadata(buffer.path())?.modified()?;
        let text = fs::read_to_string(buffer.path())?;

        if options.require_save && after == before && text == seed {
            debug!("editor closed without saving");
            return Ok(None);
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}
