//! Editor that replays canned responses.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::traits::{EditOptions, Editor};

/// An [`Editor`] that answers from a queue instead of a human.
///
/// Every seed it is opened on is recorded, so tests can assert on what the
/// operator would have seen. Once the queue is exhausted it behaves like an
/// operator who closes the editor without saving.
#[derive(Debug, Default)]
pub struct ScriptedEditor {
    responses: Mutex<VecDeque<Option<String>>>,
    seeds: Mutex<Vec<String>>,
}

impl ScriptedEditor {
    /// Create an editor with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue edited text to return from the next call.
    pub fn respond(mut self, text: impl Into<String>) -> Self {
        self.queue().push_back(Some(text.into()));
        self
    }

    /// Queue an aborted edit (operator closed without saving).
    pub fn abort(mut self) -> Self {
        self.queue().push_back(None);
        self
    }

    /// Seeds presented so far, in call order.
    pub fn seeds(&self) -> Vec<String> {
        lock(&self.seeds).clone()
    }

    fn queue(&mut self) -> &mut VecDeque<Option<String>> {
        self.responses
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Editor for ScriptedEditor {
    fn edit(&self, seed: &str, _options: &EditOptions) -> Result<Option<String>> {
        lock(&self.seeds).push(seed.to_string());
        Ok(lock(&self.responses).pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_in_order_then_aborts() {
        let editor = ScriptedEditor::new().respond("one").abort().respond("two");
        let opts = EditOptions::create();
        assert_eq!(editor.edit("s1", &opts).unwrap().as_deref(), Some("one"));
        assert_eq!(editor.edit("s2", &opts).unwrap(), None);
        assert_eq!(editor.edit("s3", &opts).unwrap().as_deref(), Some("two"));
        assert_eq!(editor.edit("s4", &opts).unwrap(), None);
        assert_eq!(editor.seeds(), vec!["s1", "s2", "s3", "s4"]);
    }
}
