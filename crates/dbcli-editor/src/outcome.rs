//! Result of an editor-driven operation.

/// How an editor-driven operation ended.
///
/// Only [`EditOutcome::Committed`] means the store was written. The other two
/// variants are normal, non-fatal endings: nothing was changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome<T> {
    /// The operator closed the editor without producing content.
    Unchanged,
    /// The edited text was not valid JSON; the message explains why.
    InvalidJson(String),
    /// The edit was applied.
    Committed(T),
}

impl<T> EditOutcome<T> {
    /// Returns `true` if the store was written.
    pub fn is_committed(&self) -> bool {
        matches!(self, EditOutcome::Committed(_))
    }

    /// Map the committed payload, leaving the other variants untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EditOutcome<U> {
        match self {
            EditOutcome::Unchanged => EditOutcome::Unchanged,
            EditOutcome::InvalidJson(msg) => EditOutcome::InvalidJson(msg),
            EditOutcome::Committed(value) => EditOutcome::Committed(f(value)),
        }
    }
}
