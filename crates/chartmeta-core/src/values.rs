//! Values handling with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::path;

/// Maximum object nesting a merge will descend into
pub const MAX_MERGE_DEPTH: usize = 64;

/// Values container with deep merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Parse values from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self(value))
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    /// - Null: overlay null replaces base
    pub fn merge(&mut self, overlay: &Values) -> Result<()> {
        merge_values(&mut self.0, &overlay.0, false)
    }

    /// Deep merge, removing keys whose overlay value is null when `delete_on_null` is set
    pub fn merge_with(&mut self, overlay: &Values, delete_on_null: bool) -> Result<()> {
        merge_values(&mut self.0, &overlay.0, delete_on_null)
    }

    /// Merge multiple values in order
    pub fn merge_all(values: Vec<Values>) -> Result<Self> {
        let mut result = Values::new();
        for v in values {
            result.merge(&v)?;
        }
        Ok(result)
    }

    /// Set a value by dotted path (e.g., "image.tag")
    pub fn set(&mut self, key: &str, value: JsonValue) -> Result<()> {
        path::set(&mut self.0, key, value)
    }

    /// Get a value by dotted path
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        path::get(&self.0, key)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

impl From<JsonValue> for Values {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Deep merge `src` into `dest`
///
/// With `delete_on_null`, a null leaf in `src` removes the key from `dest`;
/// otherwise it overwrites it with null. Keys missing from `dest` are copied
/// verbatim. Two objects are merged recursively; in every other case `src`
/// wins, arrays included.
pub fn merge_values(dest: &mut JsonValue, src: &JsonValue, delete_on_null: bool) -> Result<()> {
    merge_at_depth(dest, src, delete_on_null, 0)
}

fn merge_at_depth(
    dest: &mut JsonValue,
    src: &JsonValue,
    delete_on_null: bool,
    depth: usize,
) -> Result<()> {
    if depth > MAX_MERGE_DEPTH {
        return Err(CoreError::MergeDepthExceeded {
            depth: MAX_MERGE_DEPTH,
        });
    }

    match (dest, src) {
        (JsonValue::Object(dest_map), JsonValue::Object(src_map)) => {
            for (key, src_value) in src_map {
                if delete_on_null && src_value.is_null() {
                    dest_map.remove(key);
                    continue;
                }

                match dest_map.get_mut(key) {
                    Some(dest_value) if dest_value.is_object() && src_value.is_object() => {
                        merge_at_depth(dest_value, src_value, delete_on_null, depth + 1)?;
                    }
                    Some(dest_value) => *dest_value = src_value.clone(),
                    None => {
                        dest_map.insert(key.clone(), src_value.clone());
                    }
                }
            }
        }
        (dest, src) => {
            *dest = src.clone();
        }
    }

    Ok(())
}

/// Parse --set arguments (key=value format)
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for arg in set_args {
        let (key, val) = arg.split_once('=').ok_or_else(|| CoreError::ValuesMerge {
            message: format!("Invalid --set format: '{}'. Expected key=value", arg),
        })?;

        let json_value = if val == "true" {
            JsonValue::Bool(true)
        } else if val == "false" {
            JsonValue::Bool(false)
        } else if val == "null" {
            JsonValue::Null
        } else if let Ok(num) = val.parse::<i64>() {
            JsonValue::Number(num.into())
        } else if let Some(num) = val
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            JsonValue::Number(num)
        } else if val.starts_with('[') || val.starts_with('{') {
            serde_json::from_str(val).unwrap_or(JsonValue::String(val.to_string()))
        } else {
            JsonValue::String(val.to_string())
        };

        values.set(key, json_value)?;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#).unwrap();

        let overlay = Values::from_yaml(r#"
image:
  tag: "2.0"
  pullPolicy: Always
replicas: 3
"#).unwrap();

        base.merge(&overlay).unwrap();

        assert_eq!(base.get("image.repository").unwrap(), "nginx");
        assert_eq!(base.get("image.tag").unwrap(), "2.0");
        assert_eq!(base.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(base.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_merge_adds_sibling_keys() {
        let mut dest = json!({"a": {"x": 1}});
        merge_values(&mut dest, &json!({"a": {"y": 2}}), false).unwrap();

        assert_eq!(dest, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_merge_null_deletes_when_enabled() {
        let mut dest = json!({"a": 1});
        merge_values(&mut dest, &json!({"a": null}), true).unwrap();

        assert_eq!(dest, json!({}));
    }

    #[test]
    fn test_merge_null_overwrites_when_disabled() {
        let mut dest = json!({"a": 1});
        merge_values(&mut dest, &json!({"a": null}), false).unwrap();

        assert_eq!(dest, json!({"a": null}));
    }

    #[test]
    fn test_merge_nested_null_delete() {
        let mut dest = json!({"resources": {"cpu": "1", "memory": "1Gi"}});
        merge_values(&mut dest, &json!({"resources": {"cpu": null}}), true).unwrap();

        assert_eq!(dest, json!({"resources": {"memory": "1Gi"}}));
    }

    #[test]
    fn test_merge_arrays_are_replaced() {
        let mut dest = json!({"list": [1, 2, 3], "obj": {"k": 1}});
        merge_values(&mut dest, &json!({"list": [4], "obj": "scalar"}), false).unwrap();

        assert_eq!(dest, json!({"list": [4], "obj": "scalar"}));
    }

    #[test]
    fn test_merge_copies_missing_subtree_verbatim() {
        let mut dest = json!({});
        merge_values(&mut dest, &json!({"a": {"b": null}}), true).unwrap();

        assert_eq!(dest, json!({"a": {"b": null}}));
    }

    #[test]
    fn test_merge_depth_is_bounded() {
        let mut src = json!(1);
        let mut dest = json!(1);
        for _ in 0..(MAX_MERGE_DEPTH + 2) {
            src = json!({ "n": src });
            dest = json!({ "n": dest });
        }

        assert!(matches!(
            merge_values(&mut dest, &src, false),
            Err(CoreError::MergeDepthExceeded { .. })
        ));
    }

    #[test]
    fn test_merge_all() {
        let merged = Values::merge_all(vec![
            Values(json!({"a": 1, "b": {"c": 1}})),
            Values(json!({"b": {"d": 2}})),
        ])
        .unwrap();

        assert_eq!(merged.into_inner(), json!({"a": 1, "b": {"c": 1, "d": 2}}));
    }

    #[test]
    fn test_set_nested() {
        let mut values = Values::new();
        values.set("image.tag", JsonValue::String("v1".into())).unwrap();
        values.set("replicas", JsonValue::Number(3.into())).unwrap();

        assert_eq!(values.get("image.tag").unwrap(), "v1");
        assert_eq!(values.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_parse_set_values() {
        let args = vec![
            "image.tag=v2".to_string(),
            "replicas=5".to_string(),
            "debug=true".to_string(),
            "ratio=0.5".to_string(),
            "gone=null".to_string(),
        ];

        let values = parse_set_values(&args).unwrap();

        assert_eq!(values.get("image.tag").unwrap(), "v2");
        assert_eq!(values.get("replicas").unwrap(), 5);
        assert_eq!(values.get("debug").unwrap(), true);
        assert_eq!(values.get("ratio").unwrap(), 0.5);
        assert!(values.get("gone").unwrap().is_null());
    }

    #[test]
    fn test_parse_set_values_rejects_missing_equals() {
        assert!(parse_set_values(&["novalue".to_string()]).is_err());
    }
}
