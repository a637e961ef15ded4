//! Document commands behind `mcli`.

use dbcli_editor::{EditOptions, EditOutcome, Editor};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{DocError, DocResult};
use crate::extjson::{as_object_id, parse_document, relaxed, to_pretty_json, Document};
use crate::filter::{Filter, Query};
use crate::flatten::flatten_lines;
use crate::traits::{DocumentStore, Namespace};

/// Seed shown when adding a document.
pub fn document_scaffold() -> Value {
    json!({"title": "titlename", "key1": "value1", "key2": "value2"})
}

/// How an `_id` is listed: `ObjectId: <hex>` for object ids, else the
/// plain value.
pub fn describe_id(id: &Value) -> String {
    match (as_object_id(id), id) {
        (Some(oid), _) => format!("ObjectId: {oid}"),
        (None, Value::String(text)) => text.clone(),
        (None, other) => other.to_string(),
    }
}

/// One line per document in `ns` matching the JSON filter text.
pub fn list_documents<S: DocumentStore + ?Sized>(store: &S, ns: &Namespace, filter_json: &str) -> DocResult<Vec<String>> {
    let query = Query::parse(filter_json)?;
    Ok(store
        .find(ns, &query)?
        .iter()
        .map(|doc| describe_id(doc.get("_id").unwrap_or(&Value::Null)))
        .collect())
}

/// The matching document as relaxed pretty JSON, or `null` when nothing
/// matches. With `flatten`, one `path: value` line per leaf instead.
pub fn show_document<S: DocumentStore + ?Sized>(
    store: &S,
    ns: &Namespace,
    filter: &Filter,
    flatten: bool,
) -> DocResult<String> {
    let found = store.find_one(ns, &filter.to_query())?;
    match (found, flatten) {
        (Some(doc), false) => Ok(to_pretty_json(&relaxed(&Value::Object(doc)))),
        (None, false) => Ok("null".to_string()),
        (Some(doc), true) => Ok(flatten_lines(&relaxed(&Value::Object(doc))).join("\n")),
        (None, true) => Err(DocError::DocumentNotFound),
    }
}

/// Create a document from the operator's edit of the scaffold.
///
/// Returns the new document's `_id`.
pub fn add_document<S, E>(store: &S, ns: &Namespace, editor: &E) -> DocResult<EditOutcome<Value>>
where
    S: DocumentStore + ?Sized,
    E: Editor + ?Sized,
{
    let seed = to_pretty_json(&document_scaffold());
    let Some(edited) = editor.edit(&seed, &EditOptions::create())? else {
        return Ok(EditOutcome::Unchanged);
    };
    let doc = match parse_document(&edited) {
        Ok(doc) => doc?,
        Err(e) => {
            warn!(%ns, error = %e, "edited document is not valid JSON");
            return Ok(EditOutcome::InvalidJson(e.to_string()));
        }
    };
    let id = store.insert_one(ns, doc)?;
    info!(%ns, id = %describe_id(&id), "document added");
    Ok(EditOutcome::Committed(id))
}

/// Replace the matching document with the operator's edit of it.
///
/// The editor is seeded with canonical extended JSON so object ids and
/// dates survive the round trip.
pub fn edit_document<S, E>(store: &S, ns: &Namespace, filter: &Filter, editor: &E) -> DocResult<EditOutcome<()>>
where
    S: DocumentStore + ?Sized,
    E: Editor + ?Sized,
{
    let query = filter.to_query();
    let current: Document = store.find_one(ns, &query)?.ok_or(DocError::DocumentNotFound)?;
    let seed = to_pretty_json(&Value::Object(current));
    let Some(edited) = editor.edit(&seed, &EditOptions::modify())? else {
        return Ok(EditOutcome::Unchanged);
    };
    let doc = match parse_document(&edited) {
        Ok(doc) => doc?,
        Err(e) => {
            warn!(%ns, error = %e, "edited document is not valid JSON; store left untouched");
            return Ok(EditOutcome::InvalidJson(e.to_string()));
        }
    };
    if !store.replace_one(ns, &query, doc)? {
        return Err(DocError::DocumentNotFound);
    }
    info!(%ns, id = %describe_id(&filter.id_value()), "document edited");
    Ok(EditOutcome::Committed(()))
}

/// Delete the matching document. Returns `false` if there was none.
pub fn delete_document<S: DocumentStore + ?Sized>(store: &S, ns: &Namespace, filter: &Filter) -> DocResult<bool> {
    let deleted = store.delete_one(ns, &filter.to_query())?;
    info!(%ns, id = %describe_id(&filter.id_value()), deleted, "delete requested");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extjson::{date_value, into_document, oid_value};
    use crate::filter::build;
    use crate::memory::InMemoryDocumentStore;
    use crate::object_id::ObjectId;
    use chrono::{TimeZone, Utc};
    use dbcli_editor::ScriptedEditor;

    fn ns() -> Namespace {
        Namespace::new("mcli_db_test", "first")
    }

    fn seeded() -> (InMemoryDocumentStore, ObjectId) {
        let store = InMemoryDocumentStore::new();
        let editor = ScriptedEditor::new()
            .respond(r#"{"_id": "12", "key1": "value1"}"#)
            .respond(r#"{"key2": "value3"}"#);
        add_document(&store, &ns(), &editor).unwrap();
        let id = add_document(&store, &ns(), &editor).unwrap();
        let EditOutcome::Committed(id) = id else {
            panic!("second add did not commit");
        };
        (store, as_object_id(&id).unwrap())
    }

    #[test]
    fn add_then_list() {
        let (store, oid) = seeded();
        assert_eq!(
            list_documents(&store, &ns(), "{}").unwrap(),
            vec!["12".to_string(), format!("ObjectId: {oid}")]
        );
        assert_eq!(list_documents(&store, &ns(), r#"{"key1": "value1"}"#).unwrap(), vec!["12"]);
    }

    #[test]
    fn add_seeds_scaffold_and_handles_bad_input() {
        let store = InMemoryDocumentStore::new();
        let editor = ScriptedEditor::new().respond("{bad").respond("[1, 2]").abort();
        assert!(matches!(
            add_document(&store, &ns(), &editor).unwrap(),
            EditOutcome::InvalidJson(_)
        ));
        assert!(matches!(
            add_document(&store, &ns(), &editor),
            Err(DocError::NotADocument(_))
        ));
        assert_eq!(add_document(&store, &ns(), &editor).unwrap(), EditOutcome::Unchanged);
        assert_eq!(
            editor.seeds()[0],
            "{\n    \"title\": \"titlename\",\n    \"key1\": \"value1\",\n    \"key2\": \"value2\"\n}"
        );
        assert!(store.list_databases().unwrap().is_empty());
    }

    #[test]
    fn show_by_id_and_object_id() {
        let (store, oid) = seeded();
        let by_oid = build(None, Some(&oid.to_hex())).unwrap();
        assert_eq!(
            show_document(&store, &ns(), &by_oid, false).unwrap(),
            format!("{{\n    \"_id\": \"{oid}\",\n    \"key2\": \"value3\"\n}}")
        );
        let by_id = build(Some("12"), None).unwrap();
        assert_eq!(
            show_document(&store, &ns(), &by_id, false).unwrap(),
            "{\n    \"_id\": \"12\",\n    \"key1\": \"value1\"\n}"
        );
    }

    #[test]
    fn show_missing_document() {
        let store = InMemoryDocumentStore::new();
        let filter = build(Some("nope"), None).unwrap();
        assert_eq!(show_document(&store, &ns(), &filter, false).unwrap(), "null");
        assert!(matches!(
            show_document(&store, &ns(), &filter, true),
            Err(DocError::DocumentNotFound)
        ));
    }

    #[test]
    fn show_flattened_relaxed() {
        let store = InMemoryDocumentStore::new();
        let when = Utc.with_ymd_and_hms(2020, 5, 17, 8, 0, 0).unwrap();
        let other = ObjectId::from_bytes([1; 12]);
        let doc = into_document(json!({
            "_id": "7",
            "meta": {"created": date_value(when), "tags": ["a", "b"]},
            "ref": oid_value(other)
        }))
        .unwrap();
        store.insert_one(&ns(), doc).unwrap();
        let filter = build(Some("7"), None).unwrap();
        assert_eq!(
            show_document(&store, &ns(), &filter, true).unwrap(),
            format!(
                "_id: 7\nmeta_created: 2020-05-17T08:00:00Z\nmeta_tags_0: a\nmeta_tags_1: b\nref: {}",
                other.to_hex()
            )
        );
    }

    #[test]
    fn edit_replaces_document() {
        let (store, _) = seeded();
        let editor = ScriptedEditor::new().respond(r#"{"_id": "12", "new_key1": "new_value1"}"#);
        let filter = build(Some("12"), None).unwrap();
        assert!(edit_document(&store, &ns(), &filter, &editor).unwrap().is_committed());
        assert_eq!(
            store.find_one(&ns(), &filter.to_query()).unwrap().unwrap(),
            into_document(json!({"_id": "12", "new_key1": "new_value1"})).unwrap()
        );
        assert_eq!(editor.seeds()[0], "{\n    \"_id\": \"12\",\n    \"key1\": \"value1\"\n}");
    }

    #[test]
    fn edit_presents_canonical_object_id() {
        let (store, oid) = seeded();
        let editor = ScriptedEditor::new().abort();
        let filter = build(None, Some(&oid.to_hex())).unwrap();
        assert_eq!(edit_document(&store, &ns(), &filter, &editor).unwrap(), EditOutcome::Unchanged);
        assert!(editor.seeds()[0].contains(&format!("\"$oid\": \"{oid}\"")));
    }

    #[test]
    fn edit_with_invalid_json_leaves_document() {
        let (store, _) = seeded();
        let editor = ScriptedEditor::new().respond("{\"_id\": \"12\",");
        let filter = build(Some("12"), None).unwrap();
        assert!(matches!(
            edit_document(&store, &ns(), &filter, &editor).unwrap(),
            EditOutcome::InvalidJson(_)
        ));
        assert_eq!(
            store.find_one(&ns(), &filter.to_query()).unwrap().unwrap()["key1"],
            json!("value1")
        );
    }

    #[test]
    fn edit_missing_document_never_opens_editor() {
        let store = InMemoryDocumentStore::new();
        let editor = ScriptedEditor::new();
        let filter = build(Some("12"), None).unwrap();
        assert!(matches!(
            edit_document(&store, &ns(), &filter, &editor),
            Err(DocError::DocumentNotFound)
        ));
        assert!(editor.seeds().is_empty());
    }

    #[test]
    fn delete_document_by_id() {
        let (store, _) = seeded();
        let filter = build(Some("12"), None).unwrap();
        assert!(delete_document(&store, &ns(), &filter).unwrap());
        assert!(store.find_one(&ns(), &filter.to_query()).unwrap().is_none());
        assert!(!delete_document(&store, &ns(), &filter).unwrap());
    }
}
