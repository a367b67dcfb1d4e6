//! Dotted key paths into JSON documents
//!
//! A path such as `image.application.tag` addresses nested object keys.
//! `\.` keeps a literal dot inside a single key. Reads are lenient and
//! return nothing for missing paths; writes create intermediate objects
//! and refuse to walk through scalars or arrays.

use serde_json::{Map, Value as JsonValue};

use crate::error::{CoreError, Result};

/// Split a dotted path into its key segments
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
}

/// Get the value at `path`
///
/// Every segment is a literal object key, numeric ones included, so a
/// path never reaches into an array.
pub fn get<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return None;
    }

    split_path(path)
        .iter()
        .try_fold(doc, |node, segment| node.as_object()?.get(segment.as_str()))
}

/// Raw JSON text of the subtree at `path`, empty when absent
pub fn get_raw(doc: &JsonValue, path: &str) -> String {
    get(doc, path).map(|v| v.to_string()).unwrap_or_default()
}

/// String form of the leaf at `path`
///
/// Strings are returned verbatim, other values as their JSON text.
/// Missing and null leaves give an empty string.
pub fn get_string(doc: &JsonValue, path: &str) -> String {
    match get(doc, path) {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Set `value` at `path`, creating intermediate objects as needed
///
/// An explicit `null` is stored as a null leaf. Null intermediates are
/// replaced by objects; any other non-object intermediate is a conflict.
pub fn set(doc: &mut JsonValue, path: &str, value: JsonValue) -> Result<()> {
    let segments = split_path(path);
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CoreError::InvalidPath {
            path: path.to_string(),
            message: "empty key segment".to_string(),
        });
    }

    let Some((last, parents)) = segments.split_last() else {
        return Err(CoreError::InvalidPath {
            path: path.to_string(),
            message: "empty path".to_string(),
        });
    };

    let mut node = doc;
    let mut node_name = "(root)";
    for segment in parents {
        let map = object_mut(node, path, node_name)?;
        node = map.entry(segment.clone()).or_insert(JsonValue::Null);
        node_name = segment;
    }

    object_mut(node, path, node_name)?.insert(last.clone(), value);
    Ok(())
}

/// Parse `raw` as JSON and set it at `path`
pub fn set_raw(doc: &mut JsonValue, path: &str, raw: &str) -> Result<()> {
    let value: JsonValue = serde_json::from_str(raw)?;
    set(doc, path, value)
}

fn object_mut<'a>(
    node: &'a mut JsonValue,
    path: &str,
    segment: &str,
) -> Result<&'a mut Map<String, JsonValue>> {
    if node.is_null() {
        *node = JsonValue::Object(Map::new());
    }

    match node {
        JsonValue::Object(map) => Ok(map),
        _ => Err(CoreError::PathConflict {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_path_with_escaped_dot() {
        assert_eq!(split_path("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(
            split_path(r"annotations.app\.kubernetes\.io/name"),
            vec!["annotations", "app.kubernetes.io/name"]
        );
    }

    #[test]
    fn test_get_nested_and_missing() {
        let doc = json!({"image": {"tag": "v1"}, "env": [{"name": "A", "value": "1"}]});

        assert_eq!(get(&doc, "image.tag"), Some(&json!("v1")));
        assert_eq!(get(&doc, "env.0.name"), None);
        assert_eq!(get(&doc, "image.missing"), None);
        assert_eq!(get(&doc, "image.tag.deeper"), None);
        assert_eq!(get(&doc, ""), None);
    }

    #[test]
    fn test_numeric_segments_are_object_keys() {
        let doc = json!({"list": ["a", "b"], "ports": {"0": 8080}});
        assert_eq!(get(&doc, "list.0"), None);
        assert_eq!(get(&doc, "ports.0"), Some(&json!(8080)));

        let mut written = json!({});
        set(&mut written, "ports.0", json!(8080)).unwrap();
        assert_eq!(get(&written, "ports.0"), Some(&json!(8080)));
    }

    #[test]
    fn test_get_raw_and_string() {
        let doc = json!({"a": {"b": [1, 2]}, "n": 3, "s": "x", "z": null});

        assert_eq!(get_raw(&doc, "a.b"), "[1,2]");
        assert_eq!(get_raw(&doc, "nope"), "");
        assert_eq!(get_raw(&doc, "z"), "null");
        assert_eq!(get_string(&doc, "s"), "x");
        assert_eq!(get_string(&doc, "n"), "3");
        assert_eq!(get_string(&doc, "z"), "");
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut doc = json!({});
        set(&mut doc, "image.application.image", json!("nginx")).unwrap();
        set(&mut doc, "image.java.command", json!("run")).unwrap();

        assert_eq!(
            doc,
            json!({"image": {"application": {"image": "nginx"}, "java": {"command": "run"}}})
        );
    }

    #[test]
    fn test_set_null_is_kept() {
        let mut doc = json!({"a": 1});
        set(&mut doc, "a", JsonValue::Null).unwrap();

        assert_eq!(doc, json!({"a": null}));
    }

    #[test]
    fn test_set_conflict_with_scalar() {
        let mut doc = json!({"a": 1});
        let err = set(&mut doc, "a.b", json!(2)).unwrap_err();

        assert!(matches!(err, CoreError::PathConflict { ref segment, .. } if segment == "a"));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_set_conflict_with_array() {
        let mut doc = json!({"a": [1]});
        assert!(set(&mut doc, "a.0", json!(2)).is_err());
    }

    #[test]
    fn test_set_invalid_path() {
        let mut doc = json!({});
        assert!(matches!(
            set(&mut doc, "", json!(1)),
            Err(CoreError::InvalidPath { .. })
        ));
        assert!(matches!(
            set(&mut doc, "a..b", json!(1)),
            Err(CoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_set_raw() {
        let mut doc = json!({});
        set_raw(&mut doc, "storage", r#"{"size":"10Gi"}"#).unwrap();
        assert_eq!(doc, json!({"storage": {"size": "10Gi"}}));

        assert!(matches!(
            set_raw(&mut doc, "x", "{not json"),
            Err(CoreError::JsonParse(_))
        ));
    }
}
