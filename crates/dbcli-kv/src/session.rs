//! Edit-in-place and create-through-editor workflows.
//!
//! An [`EditSession`] walks one key through
//! `Loading → Presenting → AwaitingEdit → Committing → Committed`, ending in
//! `Aborted` on every other path. The store is only written in
//! `Committing`, and only after the edited document has been validated
//! and normalized against the key's original type.
//!
//! # Known race
//!
//! Committing deletes the old key and then writes the new value. Two
//! sessions committing the same key at the same time can interleave and lose
//! one update, and a failed write after the delete leaves the key absent
//! (reported as [`KvError::CommitFailed`]). There is no undo log.

use dbcli_editor::{EditOptions, EditOutcome, Editor};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::decode::decode;
use crate::encode::{apply, normalize, write};
use crate::error::{KvError, KvResult};
use crate::registry::{fetch, resolve_tag, scaffold_for, ValueTag};
use crate::traits::KeyValueStore;

/// Where an [`EditSession`] currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Reading the current value and its type.
    Loading,
    /// Building the editable document.
    Presenting,
    /// Waiting for the operator to close the editor.
    AwaitingEdit,
    /// Validating and writing the edited value.
    Committing,
    /// The edited value was written.
    Committed,
    /// The session ended without writing.
    Aborted,
}

/// Render JSON the way it is shown to the operator: 4-space indentation.
pub fn to_pretty_json(value: &Value) -> String {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    // Serializing a `Value` into a Vec cannot fail.
    if serde::Serialize::serialize(value, &mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}

/// Interactive edit of a single key.
pub struct EditSession<'a, S: ?Sized> {
    store: &'a S,
    key: String,
    state: SessionState,
}

impl<'a, S: KeyValueStore + ?Sized> EditSession<'a, S> {
    /// Create a session for `key`. Nothing is read until [`run`](Self::run).
    pub fn new(store: &'a S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            state: SessionState::Loading,
        }
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The key being edited.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn transition(&mut self, next: SessionState) {
        debug!(key = %self.key, from = ?self.state, to = ?next, "edit session transition");
        self.state = next;
    }

    /// Run the whole session against `editor`.
    ///
    /// Returns the key the value ended up under when committed.
    pub fn run<E: Editor + ?Sized>(&mut self, editor: &E) -> KvResult<EditOutcome<String>> {
        let result = self.drive(editor);
        let terminal = match &result {
            Ok(EditOutcome::Committed(_)) => SessionState::Committed,
            _ => SessionState::Aborted,
        };
        self.transition(terminal);
        result
    }

    fn drive<E: Editor + ?Sized>(&mut self, editor: &E) -> KvResult<EditOutcome<String>> {
        self.transition(SessionState::Loading);
        let tag = resolve_tag(self.store, &self.key)?;

        self.transition(SessionState::Presenting);
        let document = self.present(tag)?;

        self.transition(SessionState::AwaitingEdit);
        let Some(edited) = editor.edit(&to_pretty_json(&document), &EditOptions::modify())? else {
            info!(key = %self.key, "editor closed without changes");
            return Ok(EditOutcome::Unchanged);
        };
        let parsed: Value = match serde_json::from_str(&edited) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.key, error = %e, "edited text is not valid JSON; store left untouched");
                return Ok(EditOutcome::InvalidJson(e.to_string()));
            }
        };

        self.transition(SessionState::Committing);
        self.commit(tag, parsed).map(EditOutcome::Committed)
    }

    /// Build the editable `{key: value}` document for the current value.
    pub fn present(&self, tag: ValueTag) -> KvResult<Value> {
        if tag == ValueTag::HyperLogLogSet {
            return Err(KvError::NotEditable {
                key: self.key.clone(),
                reason: "HyperLogLog values cannot be edited".into(),
            });
        }
        let raw = fetch(self.store, tag, &self.key)?;
        let value = decode(&raw).map_err(|e| KvError::NotEditable {
            key: self.key.clone(),
            reason: e.to_string(),
        })?;
        let mut document = Map::new();
        document.insert(self.key.clone(), value);
        Ok(Value::Object(document))
    }

    /// Replace the current value with the single entry of `edited`.
    ///
    /// The entry's key may differ from the original (a rename); an existing
    /// value under the new name is replaced. The value is normalized with the
    /// original tag before anything is deleted.
    pub fn commit(&self, tag: ValueTag, edited: Value) -> KvResult<String> {
        let Value::Object(entries) = edited else {
            return Err(KvError::AmbiguousKey { found: 0 });
        };
        if entries.len() != 1 {
            return Err(KvError::AmbiguousKey {
                found: entries.len(),
            });
        }
        let Some((new_key, value)) = entries.into_iter().next() else {
            return Err(KvError::AmbiguousKey { found: 0 });
        };

        let typed = normalize(tag.edit_tag(), &value)?;

        self.store.del(self.key.as_bytes())?;
        if new_key != self.key {
            self.store.del(new_key.as_bytes())?;
        }
        apply(self.store, new_key.as_bytes(), &typed).map_err(|source| {
            warn!(original = %self.key, key = %new_key, error = %source, "write after delete failed");
            KvError::CommitFailed {
                original: self.key.clone(),
                key: new_key.clone(),
                source,
            }
        })?;
        info!(original = %self.key, key = %new_key, %tag, "key edited");
        Ok(new_key)
    }
}

/// Create `key` as a value of type `tag` from the operator's edit of the
/// tag's scaffold.
pub fn add_key<S, E>(store: &S, editor: &E, key: &str, tag: ValueTag) -> KvResult<EditOutcome<String>>
where
    S: KeyValueStore + ?Sized,
    E: Editor + ?Sized,
{
    let seed = to_pretty_json(&scaffold_for(tag));
    let Some(edited) = editor.edit(&seed, &EditOptions::create())? else {
        return Ok(EditOutcome::Unchanged);
    };
    let value: Value = match serde_json::from_str(&edited) {
        Ok(value) => value,
        Err(e) => return Ok(EditOutcome::InvalidJson(e.to_string())),
    };
    write(store, tag, key, &value)?;
    info!(key, %tag, "key added");
    Ok(EditOutcome::Committed(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::memory::InMemoryKeyValueStore;
    use dbcli_editor::ScriptedEditor;
    use serde_json::json;

    fn b(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    /// Store wrapper that counts mutations and can refuse writes.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryKeyValueStore,
        writes: std::sync::atomic::AtomicUsize,
        fail_writes: bool,
    }

    impl CountingStore {
        fn writes(&self) -> usize {
            self.writes.load(std::sync::atomic::Ordering::SeqCst)
        }

        fn count(&self) -> StoreResult<()> {
            self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        fn refuse(&self) -> StoreResult<()> {
            self.count()?;
            if self.fail_writes {
                return Err(StoreError::Unavailable("write refused".into()));
            }
            Ok(())
        }
    }

    impl KeyValueStore for CountingStore {
        fn keys(&self, pattern: &str) -> StoreResult<Vec<Vec<u8>>> {
            self.inner.keys(pattern)
        }
        fn key_type(&self, key: &[u8]) -> StoreResult<String> {
            self.inner.key_type(key)
        }
        fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }
        fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>> {
            self.inner.lrange(key, start, stop)
        }
        fn smembers(&self, key: &[u8]) -> StoreResult<Vec<Vec<u8>>> {
            self.inner.smembers(key)
        }
        fn hgetall(&self, key: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
            self.inner.hgetall(key)
        }
        fn zrange_with_scores(&self, key: &[u8], start: i64, stop: i64) -> StoreResult<Vec<(Vec<u8>, f64)>> {
            self.inner.zrange_with_scores(key, start, stop)
        }
        fn getbit(&self, key: &[u8], offset: u64) -> StoreResult<bool> {
            self.inner.getbit(key, offset)
        }
        fn pfcount(&self, key: &[u8]) -> StoreResult<u64> {
            self.inner.pfcount(key)
        }
        fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
            self.refuse()?;
            self.inner.set(key, value)
        }
        fn rpush(&self, key: &[u8], values: &[Vec<u8>]) -> StoreResult<usize> {
            self.refuse()?;
            self.inner.rpush(key, values)
        }
        fn sadd(&self, key: &[u8], members: &[Vec<u8>]) -> StoreResult<usize> {
            self.refuse()?;
            self.inner.sadd(key, members)
        }
        fn hset_multiple(&self, key: &[u8], fields: &[(Vec<u8>, Vec<u8>)]) -> StoreResult<()> {
            self.refuse()?;
            self.inner.hset_multiple(key, fields)
        }
        fn zadd_multiple(&self, key: &[u8], members: &[(Vec<u8>, f64)]) -> StoreResult<usize> {
            self.refuse()?;
            self.inner.zadd_multiple(key, members)
        }
        fn pfadd(&self, key: &[u8], elements: &[Vec<u8>]) -> StoreResult<bool> {
            self.refuse()?;
            self.inner.pfadd(key, elements)
        }
        fn setbit(&self, key: &[u8], offset: u64, value: bool) -> StoreResult<bool> {
            self.refuse()?;
            self.inner.setbit(key, offset, value)
        }
        fn del(&self, key: &[u8]) -> StoreResult<bool> {
            self.count()?;
            self.inner.del(key)
        }
    }

    #[test]
    fn missing_key_fails_without_writes() {
        let store = CountingStore::default();
        let editor = ScriptedEditor::new().respond("{\"k\": \"v\"}");
        let mut session = EditSession::new(&store, "ghost");
        let err = session.run(&editor).unwrap_err();
        assert!(matches!(err, KvError::KeyNotFound { .. }));
        assert_eq!(session.state(), SessionState::Aborted);
        assert_eq!(store.writes(), 0);
        assert!(editor.seeds().is_empty());
    }

    #[test]
    fn presents_pretty_single_key_document() {
        let store = InMemoryKeyValueStore::new();
        store.rpush(b"k3", &[b("a"), b("b")]).unwrap();
        let editor = ScriptedEditor::new().abort();
        let outcome = EditSession::new(&store, "k3").run(&editor).unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(editor.seeds(), vec!["{\n    \"k3\": [\n        \"a\",\n        \"b\"\n    ]\n}"]);
    }

    #[test]
    fn edits_string_hash_and_list() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"key1", b"value1").unwrap();
        store.hset_multiple(b"key2", &[(b("key21"), b("value21")), (b("key22"), b("value22"))]).unwrap();
        store.rpush(b"key3", &[b("value31"), b("value32")]).unwrap();

        let editor = ScriptedEditor::new()
            .respond(r#"{"key1": "val1"}"#)
            .respond(r#"{"key2": {"key21": "val21"}}"#)
            .respond(r#"{"key3": ["val31", "val32"]}"#);
        for key in ["key1", "key2", "key3"] {
            let mut session = EditSession::new(&store, key);
            assert!(session.run(&editor).unwrap().is_committed());
            assert_eq!(session.state(), SessionState::Committed);
        }

        assert_eq!(store.get(b"key1").unwrap(), Some(b("val1")));
        assert_eq!(store.hgetall(b"key2").unwrap(), vec![(b("key21"), b("val21"))]);
        assert_eq!(store.lrange(b"key3", 0, -1).unwrap(), vec![b("val31"), b("val32")]);
    }

    #[test]
    fn rename_moves_value_and_keeps_type() {
        let store = InMemoryKeyValueStore::new();
        store.sadd(b"old", &[b("x")]).unwrap();
        let editor = ScriptedEditor::new().respond(r#"{"new": ["x", "y"]}"#);
        let outcome = EditSession::new(&store, "old").run(&editor).unwrap();
        assert_eq!(outcome, EditOutcome::Committed("new".into()));
        assert!(!store.exists(b"old").unwrap());
        assert_eq!(store.key_type(b"new").unwrap(), "set");
        assert_eq!(store.smembers(b"new").unwrap(), vec![b("x"), b("y")]);
    }

    #[test]
    fn two_keys_is_ambiguous_and_leaves_value() {
        let store = CountingStore::default();
        store.inner.set(b"k", b"orig").unwrap();
        let editor = ScriptedEditor::new().respond(r#"{"k": "a", "k2": "b"}"#);
        let mut session = EditSession::new(&store, "k");
        let err = session.run(&editor).unwrap_err();
        assert!(matches!(err, KvError::AmbiguousKey { found: 2 }));
        assert_eq!(session.state(), SessionState::Aborted);
        assert_eq!(store.writes(), 0);
        assert_eq!(store.get(b"k").unwrap(), Some(b("orig")));
    }

    #[test]
    fn non_object_edit_is_ambiguous() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"k", b"orig").unwrap();
        let editor = ScriptedEditor::new().respond(r#"["k", "v"]"#);
        let err = EditSession::new(&store, "k").run(&editor).unwrap_err();
        assert!(matches!(err, KvError::AmbiguousKey { found: 0 }));
        assert_eq!(store.get(b"k").unwrap(), Some(b("orig")));
    }

    #[test]
    fn invalid_json_leaves_store_untouched() {
        let store = CountingStore::default();
        store.inner.rpush(b"l", &[b("a")]).unwrap();
        let editor = ScriptedEditor::new().respond("{\"l\": [\"a\",");
        let mut session = EditSession::new(&store, "l");
        let outcome = session.run(&editor).unwrap();
        assert!(matches!(outcome, EditOutcome::InvalidJson(_)));
        assert_eq!(session.state(), SessionState::Aborted);
        assert_eq!(store.writes(), 0);
        assert_eq!(store.lrange(b"l", 0, -1).unwrap(), vec![b("a")]);
    }

    #[test]
    fn malformed_value_is_rejected_before_delete() {
        let store = CountingStore::default();
        store.inner.rpush(b"l", &[b("a")]).unwrap();
        let editor = ScriptedEditor::new().respond(r#"{"l": {"not": "a list"}}"#);
        let err = EditSession::new(&store, "l").run(&editor).unwrap_err();
        assert!(matches!(err, KvError::MalformedValue { tag: ValueTag::List, .. }));
        assert_eq!(store.writes(), 0);
        assert_eq!(store.lrange(b"l", 0, -1).unwrap(), vec![b("a")]);
    }

    #[test]
    fn failed_write_after_delete_is_commit_failed() {
        let mut store = CountingStore::default();
        store.inner.set(b"k", b"orig").unwrap();
        store.fail_writes = true;
        let editor = ScriptedEditor::new().respond(r#"{"k": "new"}"#);
        let err = EditSession::new(&store, "k").run(&editor).unwrap_err();
        assert!(matches!(err, KvError::CommitFailed { .. }));
        assert!(err.to_string().contains("recreate it manually"));
        assert!(!store.exists(b"k").unwrap());
    }

    #[test]
    fn hyperloglog_is_not_editable() {
        let store = InMemoryKeyValueStore::new();
        store.pfadd(b"h", &[b("1")]).unwrap();
        let editor = ScriptedEditor::new();
        let err = EditSession::new(&store, "h").run(&editor).unwrap_err();
        assert!(matches!(err, KvError::NotEditable { .. }));
        assert!(editor.seeds().is_empty());
    }

    #[test]
    fn binary_string_is_not_editable() {
        let store = InMemoryKeyValueStore::new();
        store.set(b"bin", &[0xc3, 0x28]).unwrap();
        let err = EditSession::new(&store, "bin").run(&ScriptedEditor::new()).unwrap_err();
        assert!(matches!(err, KvError::NotEditable { .. }));
    }

    #[test]
    fn sorted_set_edits_as_score_mapping() {
        let store = InMemoryKeyValueStore::new();
        store.zadd_multiple(b"z", &[(b("a"), 1.5)]).unwrap();
        let editor = ScriptedEditor::new().respond(r#"{"z": {"a": 2.5, "b": 3}}"#);
        EditSession::new(&store, "z").run(&editor).unwrap();
        assert!(editor.seeds()[0].contains("\"a\": 1.5"));
        assert_eq!(
            store.zrange_with_scores(b"z", 0, -1).unwrap(),
            vec![(b("a"), 2.5), (b("b"), 3.0)]
        );
    }

    #[test]
    fn integral_scores_are_presented_as_integers() {
        let store = InMemoryKeyValueStore::new();
        write(&store, ValueTag::SortedSet, "z", &json!({"m": 3})).unwrap();
        let editor = ScriptedEditor::new().abort();
        EditSession::new(&store, "z").run(&editor).unwrap();
        assert_eq!(editor.seeds()[0], "{\n    \"z\": {\n        \"m\": 3\n    }\n}");
    }

    #[test]
    fn text_starting_like_a_sketch_is_editable() {
        let store = InMemoryKeyValueStore::new();
        write(&store, ValueTag::String, "s", &json!("HYLLO world")).unwrap();
        write(&store, ValueTag::List, "l", &json!(["ok", "HYLL"])).unwrap();
        let editor = ScriptedEditor::new()
            .respond(r#"{"s": "HYLLO there"}"#)
            .respond(r#"{"l": ["HYLL", "ok"]}"#);
        assert!(EditSession::new(&store, "s").run(&editor).unwrap().is_committed());
        assert!(EditSession::new(&store, "l").run(&editor).unwrap().is_committed());
        assert_eq!(editor.seeds()[0], "{\n    \"s\": \"HYLLO world\"\n}");
        assert_eq!(store.get(b"s").unwrap(), Some(b("HYLLO there")));
        assert_eq!(store.lrange(b"l", 0, -1).unwrap(), vec![b("HYLL"), b("ok")]);
    }

    #[test]
    fn bitmap_edits_as_text() {
        let store = InMemoryKeyValueStore::new();
        store.setbit(b"bits", 1, true).unwrap();
        let editor = ScriptedEditor::new().respond(r#"{"bits": "A"}"#);
        EditSession::new(&store, "bits").run(&editor).unwrap();
        assert_eq!(editor.seeds()[0], "{\n    \"bits\": \"@\"\n}");
        assert_eq!(store.get(b"bits").unwrap(), Some(b("A")));
    }

    #[test]
    fn add_key_writes_edited_scaffold() {
        let store = InMemoryKeyValueStore::new();
        let editor = ScriptedEditor::new().respond(r#"["a", "b", "c"]"#);
        let outcome = add_key(&store, &editor, "k1", ValueTag::List).unwrap();
        assert_eq!(outcome, EditOutcome::Committed("k1".into()));
        assert!(editor.seeds()[0].contains("value1"));
        assert_eq!(store.lrange(b"k1", 0, -1).unwrap(), vec![b("a"), b("b"), b("c")]);
    }

    #[test]
    fn add_key_handles_abort_and_bad_json() {
        let store = InMemoryKeyValueStore::new();
        let editor = ScriptedEditor::new().abort().respond("{oops");
        assert_eq!(add_key(&store, &editor, "k", ValueTag::String).unwrap(), EditOutcome::Unchanged);
        assert!(matches!(
            add_key(&store, &editor, "k", ValueTag::String).unwrap(),
            EditOutcome::InvalidJson(_)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn add_key_bits_from_scaffold() {
        let store = InMemoryKeyValueStore::new();
        let seed = to_pretty_json(&scaffold_for(ValueTag::Bitmap));
        let editor = ScriptedEditor::new().respond(seed);
        add_key(&store, &editor, "b", ValueTag::Bitmap).unwrap();
        assert!(store.getbit(b"b", 1).unwrap());
        assert_eq!(store.key_type(b"b").unwrap(), "bitmap");
    }

    #[test]
    fn pretty_json_uses_four_spaces() {
        assert_eq!(to_pretty_json(&json!({"a": 1})), "{\n    \"a\": 1\n}");
    }
}
