//! Flattened `path: value` view of a document.
//!
//! Nested keys are joined with `_`, array elements contribute their index:
//! `{"a": {"b": ["x"]}}` flattens to `a_b_0: x`.

use serde_json::Value;

/// Separator between path segments.
pub const SEPARATOR: char = '_';

fn walk(prefix: Option<String>, value: &Value, out: &mut Vec<(String, Value)>) {
    let join = |segment: &str| match &prefix {
        Some(p) => format!("{p}{SEPARATOR}{segment}"),
        None => segment.to_string(),
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                walk(Some(join(key.as_str())), child, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                walk(Some(join(index.to_string().as_str())), child, out);
            }
        }
        leaf => out.push((prefix.clone().unwrap_or_default(), leaf.clone())),
    }
}

/// Every leaf of `value` with its joined path, in document order.
///
/// Empty objects and arrays are kept as leaves.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    walk(None, value, &mut out);
    out
}

/// Display lines `path: value`; strings are printed without quotes.
pub fn flatten_lines(value: &Value) -> Vec<String> {
    flatten(value)
        .into_iter()
        .map(|(path, leaf)| match leaf {
            Value::String(text) => format!("{path}: {text}"),
            other => format!("{path}: {other}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_nested_paths_with_indices() {
        let doc = json!({"_id": "12", "a": {"b": ["x", {"c": 1}]}, "empty": {}, "none": null});
        assert_eq!(
            flatten_lines(&doc),
            vec!["_id: 12", "a_b_0: x", "a_b_1_c: 1", "empty: {}", "none: null"]
        );
    }

    #[test]
    fn flat_document_is_unchanged() {
        let doc = json!({"k": true, "n": 2.5});
        assert_eq!(
            flatten(&doc),
            vec![("k".to_string(), json!(true)), ("n".to_string(), json!(2.5))]
        );
    }
}
