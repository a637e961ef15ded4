//! The [`Editor`] trait and its per-call options.

use crate::error::Result;

/// Options for a single editor round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOptions {
    /// When set, a buffer the operator did not save counts as "no content".
    pub require_save: bool,
    /// File extension of the temporary buffer, including the leading dot.
    /// Editors use it to pick syntax highlighting.
    pub extension: String,
}

impl EditOptions {
    /// Options for creating new content: an unsaved seed is still accepted.
    pub fn create() -> Self {
        Self {
            require_save: false,
            extension: ".json".into(),
        }
    }

    /// Options for editing existing content: the operator must save.
    pub fn modify() -> Self {
        Self {
            require_save: true,
            extension: ".json".into(),
        }
    }
}

impl Default for EditOptions {
    fn default() -> Self {
        Self::create()
    }
}

/// Presents seed text to a human and returns what they produced.
///
/// The call blocks until the editor is closed. There is no timeout;
/// cancellation is the operator closing the editor without saving, which
/// implementations surface as `Ok(None)`.
pub trait Editor {
    /// Open the editor on `seed` and return the edited text.
    ///
    /// Returns `Ok(None)` if the operator aborted or left the buffer empty.
    fn edit(&self, seed: &str, options: &EditOptions) -> Result<Option<String>>;
}

impl<E: Editor + ?Sized> Editor for &E {
    fn edit(&self, seed: &str, options: &EditOptions) -> Result<Option<String>> {
        (**self).edit(seed, options)
    }
}
