//! Type codecs between nested documents and flat parameter values
//!
//! Every knob in the meta info is bound to a codec. `extract` reads the
//! native value at a map key and never fails: missing or malformed data
//! degrades to the type's zero value with a warning. `construct` produces
//! the JSON that is spliced back at the map key and fails on values that
//! cannot be represented.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::path;
use crate::quantity::{self, BinaryUnit, MEMORY_UNIT, STORAGE_UNIT};

/// Extract/construct pair for one kind of knob
pub trait Codec {
    type Value: Clone + fmt::Debug + Default + PartialEq + Serialize + DeserializeOwned;

    fn extract(doc: &JsonValue, map_key: &str) -> Self::Value;

    fn construct(value: &Self::Value) -> Result<JsonValue>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StringCodec;

impl Codec for StringCodec {
    type Value = String;

    fn extract(doc: &JsonValue, map_key: &str) -> String {
        path::get_string(doc, map_key)
    }

    fn construct(value: &String) -> Result<JsonValue> {
        Ok(JsonValue::String(value.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntCodec;

impl Codec for IntCodec {
    type Value = i64;

    fn extract(doc: &JsonValue, map_key: &str) -> i64 {
        match path::get(doc, map_key) {
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_else(|| {
                    tracing::warn!("failed to parse int at {}: {:?}", map_key, s);
                    0
                }),
            Some(JsonValue::Bool(b)) => i64::from(*b),
            _ => 0,
        }
    }

    fn construct(value: &i64) -> Result<JsonValue> {
        Ok(JsonValue::from(*value))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatCodec;

impl Codec for FloatCodec {
    type Value = f64;

    fn extract(doc: &JsonValue, map_key: &str) -> f64 {
        match path::get(doc, map_key) {
            Some(JsonValue::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(JsonValue::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("failed to parse float at {}: {:?}", map_key, s);
                0.0
            }),
            Some(JsonValue::Bool(b)) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    fn construct(value: &f64) -> Result<JsonValue> {
        serde_json::Number::from_f64(*value)
            .map(JsonValue::Number)
            .ok_or_else(|| CoreError::InvalidParam {
                name: String::new(),
                kind: ConfigKind::Float.to_string(),
                message: format!("{} is not a finite number", value),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    type Value = bool;

    fn extract(doc: &JsonValue, map_key: &str) -> bool {
        match path::get(doc, map_key) {
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(JsonValue::String(s)) => parse_bool(s).unwrap_or_default(),
            _ => false,
        }
    }

    fn construct(value: &bool) -> Result<JsonValue> {
        Ok(JsonValue::Bool(*value))
    }
}

/// Parse a boolean spelled `1/0`, `t/f` or `true/false` in lower, upper or title case
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// A container environment variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvCodec;

impl Codec for EnvCodec {
    type Value = Vec<EnvVar>;

    fn extract(doc: &JsonValue, map_key: &str) -> Vec<EnvVar> {
        let Some(raw) = path::get(doc, map_key) else {
            return Vec::new();
        };
        if raw.is_null() {
            return Vec::new();
        }

        match Vec::<EnvVar>::deserialize(raw) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!("failed to decode env list at {}: {}", map_key, e);
                Vec::new()
            }
        }
    }

    fn construct(value: &Vec<EnvVar>) -> Result<JsonValue> {
        Ok(serde_json::to_value(value)?)
    }
}

/// Read the quantity string at `map_key`, `None` when absent or empty
fn quantity_str(doc: &JsonValue, map_key: &str) -> Option<String> {
    if map_key.is_empty() {
        return None;
    }
    let raw = path::get_string(doc, map_key);
    (!raw.is_empty()).then_some(raw)
}

fn extract_binary(doc: &JsonValue, map_key: &str, unit: BinaryUnit) -> i64 {
    let Some(raw) = quantity_str(doc, map_key) else {
        return 0;
    };

    quantity::parse_binary(&raw, unit).unwrap_or_else(|e| {
        tracing::warn!("failed to parse quantity at {}: {}", map_key, e);
        0
    })
}

/// Memory in whole Mi
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryCodec;

impl Codec for MemoryCodec {
    type Value = i64;

    fn extract(doc: &JsonValue, map_key: &str) -> i64 {
        extract_binary(doc, map_key, MEMORY_UNIT)
    }

    fn construct(value: &i64) -> Result<JsonValue> {
        Ok(JsonValue::String(quantity::format_binary(*value, MEMORY_UNIT)))
    }
}

/// Storage size in whole Gi
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StorageSizeCodec;

impl Codec for StorageSizeCodec {
    type Value = i64;

    fn extract(doc: &JsonValue, map_key: &str) -> i64 {
        extract_binary(doc, map_key, STORAGE_UNIT)
    }

    fn construct(value: &i64) -> Result<JsonValue> {
        Ok(JsonValue::String(quantity::format_binary(*value, STORAGE_UNIT)))
    }
}

/// CPU or GPU as a fractional core count
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoresCodec;

impl Codec for CoresCodec {
    type Value = f64;

    fn extract(doc: &JsonValue, map_key: &str) -> f64 {
        let Some(raw) = quantity_str(doc, map_key) else {
            return 0.0;
        };

        quantity::parse_cores(&raw).unwrap_or_else(|e| {
            tracing::warn!("failed to parse quantity at {}: {}", map_key, e);
            0.0
        })
    }

    fn construct(value: &f64) -> Result<JsonValue> {
        Ok(JsonValue::String(quantity::format_cores(*value)))
    }
}

/// A persistent volume request with its size in Gi
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    #[serde(default)]
    pub access_modes: Vec<String>,
    #[serde(default)]
    pub storage_class: String,
    #[serde(default)]
    pub size: i64,
}

/// The same request as it appears in a values document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageDocument {
    #[serde(default)]
    access_modes: Vec<String>,
    #[serde(default)]
    storage_class: String,
    #[serde(default)]
    size: JsonValue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StorageCodec;

impl Codec for StorageCodec {
    type Value = Option<StorageSpec>;

    fn extract(doc: &JsonValue, map_key: &str) -> Option<StorageSpec> {
        let raw = path::get(doc, map_key).filter(|v| !v.is_null())?;

        let storage = match StorageDocument::deserialize(raw) {
            Ok(storage) => storage,
            Err(e) => {
                tracing::warn!("failed to decode storage at {}: {}", map_key, e);
                return None;
            }
        };

        Some(StorageSpec {
            access_modes: storage.access_modes,
            storage_class: storage.storage_class,
            size: StorageSizeCodec::extract(raw, "size"),
        })
    }

    fn construct(value: &Option<StorageSpec>) -> Result<JsonValue> {
        let Some(spec) = value else {
            return Ok(JsonValue::Null);
        };

        let storage = StorageDocument {
            access_modes: spec.access_modes.clone(),
            storage_class: spec.storage_class.clone(),
            size: StorageSizeCodec::construct(&spec.size)?,
        };
        Ok(serde_json::to_value(storage)?)
    }
}

/// Raw JSON text, the payload of a flat parameter
///
/// An empty payload constructs to null, which callers treat as deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawCodec;

impl Codec for RawCodec {
    type Value = String;

    fn extract(doc: &JsonValue, map_key: &str) -> String {
        path::get_raw(doc, map_key)
    }

    fn construct(value: &String) -> Result<JsonValue> {
        if value.is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_str(value)?)
    }
}

/// Declared type of a flat parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigKind {
    String,
    Int,
    Float,
    Boolean,
    Yaml,
    Json,
    KvPair,
    Text,
    /// A tag this engine does not know
    ///
    /// The original tag is not kept: a schema loaded with an unknown type
    /// serializes back as `unknown`.
    #[serde(other)]
    Unknown,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::String => "string",
            ConfigKind::Int => "int",
            ConfigKind::Float => "float",
            ConfigKind::Boolean => "boolean",
            ConfigKind::Yaml => "yaml",
            ConfigKind::Json => "json",
            ConfigKind::KvPair => "kvPair",
            ConfigKind::Text => "text",
            ConfigKind::Unknown => "unknown",
        }
    }

    /// Decode a raw JSON payload, checking it against this kind
    ///
    /// Empty payloads and `null` decode to [`ParamValue::Null`].
    pub fn decode(&self, raw: &str) -> Result<ParamValue> {
        if raw.trim().is_empty() {
            return Ok(ParamValue::Null);
        }

        let json: JsonValue = serde_json::from_str(raw)?;
        let mismatch = || CoreError::InvalidParam {
            name: String::new(),
            kind: self.to_string(),
            message: format!("unexpected payload {}", raw),
        };

        Ok(match (self, json) {
            (_, JsonValue::Null) => ParamValue::Null,
            (ConfigKind::String | ConfigKind::Text, JsonValue::String(s)) => ParamValue::String(s),
            (ConfigKind::String | ConfigKind::Text, _) => return Err(mismatch()),
            (ConfigKind::Int, JsonValue::Number(n)) => {
                ParamValue::Int(n.as_i64().ok_or_else(mismatch)?)
            }
            (ConfigKind::Int, _) => return Err(mismatch()),
            (ConfigKind::Float, JsonValue::Number(n)) => {
                ParamValue::Float(n.as_f64().ok_or_else(mismatch)?)
            }
            (ConfigKind::Float, _) => return Err(mismatch()),
            (ConfigKind::Boolean, JsonValue::Bool(b)) => ParamValue::Bool(b),
            (ConfigKind::Boolean, _) => return Err(mismatch()),
            (ConfigKind::Yaml | ConfigKind::Json | ConfigKind::KvPair | ConfigKind::Unknown, json) => {
                ParamValue::Structured(json)
            }
        })
    }

    /// Re-encode end-user text as the JSON payload for this kind
    ///
    /// `yaml` input is parsed as YAML and re-emitted as JSON; `json` and
    /// `kvPair` input must already be JSON and passes through unchanged.
    pub fn encode_input(&self, input: &str) -> Result<String> {
        let invalid = |message: String| CoreError::InvalidParam {
            name: String::new(),
            kind: self.to_string(),
            message,
        };

        let value = match self {
            ConfigKind::String | ConfigKind::Text | ConfigKind::Unknown => {
                ParamValue::String(input.to_string())
            }
            ConfigKind::Int => ParamValue::Int(
                input
                    .trim()
                    .parse()
                    .map_err(|e| invalid(format!("'{}': {}", input, e)))?,
            ),
            ConfigKind::Float => ParamValue::Float(
                input
                    .trim()
                    .parse()
                    .map_err(|e| invalid(format!("'{}': {}", input, e)))?,
            ),
            ConfigKind::Boolean => ParamValue::Bool(
                parse_bool(input).ok_or_else(|| invalid(format!("'{}' is not a boolean", input)))?,
            ),
            ConfigKind::Json | ConfigKind::KvPair => {
                serde_json::from_str::<JsonValue>(input)?;
                return Ok(input.to_string());
            }
            ConfigKind::Yaml => ParamValue::Structured(serde_yaml::from_str(input)?),
        };

        value.to_raw()
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded flat parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Structured(JsonValue),
}

impl ParamValue {
    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(match self {
            ParamValue::Null => JsonValue::Null,
            ParamValue::String(s) => JsonValue::String(s.clone()),
            ParamValue::Int(i) => JsonValue::from(*i),
            ParamValue::Float(f) => FloatCodec::construct(f)?,
            ParamValue::Bool(b) => JsonValue::Bool(*b),
            ParamValue::Structured(v) => v.clone(),
        })
    }

    /// Wire form: the JSON text of the value
    pub fn to_raw(&self) -> Result<String> {
        Ok(self.to_json()?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> JsonValue {
        json!({
            "image": "nginx:1.25",
            "replicas": 3,
            "ratio": "0.75",
            "flag": "true",
            "env": [{"name": "A", "value": "1"}],
            "badEnv": "oops",
            "resources": {
                "memory": "512Mi",
                "bigMemory": "1Gi",
                "cpu": "500m",
                "gpu": 2,
                "broken": "lots"
            },
            "storage": {"accessModes": ["ReadWriteOnce"], "storageClass": "gp2", "size": "10Gi"}
        })
    }

    #[test]
    fn test_scalar_extract() {
        let doc = doc();
        assert_eq!(StringCodec::extract(&doc, "image"), "nginx:1.25");
        assert_eq!(StringCodec::extract(&doc, "replicas"), "3");
        assert_eq!(StringCodec::extract(&doc, "missing"), "");
        assert_eq!(IntCodec::extract(&doc, "replicas"), 3);
        assert_eq!(IntCodec::extract(&doc, "missing"), 0);
        assert_eq!(FloatCodec::extract(&doc, "ratio"), 0.75);
        assert!(BoolCodec::extract(&doc, "flag"));
        assert!(!BoolCodec::extract(&doc, "missing"));
    }

    #[test]
    fn test_env_extract_is_lenient() {
        let doc = doc();
        assert_eq!(EnvCodec::extract(&doc, "env"), vec![EnvVar::new("A", "1")]);
        assert!(EnvCodec::extract(&doc, "badEnv").is_empty());
        assert!(EnvCodec::extract(&doc, "missing").is_empty());
    }

    #[test]
    fn test_memory_codec() {
        let doc = doc();
        assert_eq!(MemoryCodec::extract(&doc, "resources.memory"), 512);
        assert_eq!(MemoryCodec::extract(&doc, "resources.bigMemory"), 1024);
        assert_eq!(MemoryCodec::extract(&doc, "resources.broken"), 0);
        assert_eq!(MemoryCodec::extract(&doc, "resources.missing"), 0);
        assert_eq!(MemoryCodec::construct(&512).unwrap(), json!("512Mi"));
    }

    #[test]
    fn test_numbers_in_bad_strings_read_as_zero() {
        let doc = json!({"bad": "abc", "padded": " 42 ", "decimal": "2.5"});
        assert_eq!(IntCodec::extract(&doc, "bad"), 0);
        assert_eq!(FloatCodec::extract(&doc, "bad"), 0.0);
        assert_eq!(IntCodec::extract(&doc, "padded"), 42);
        assert_eq!(IntCodec::extract(&doc, "decimal"), 2);
        assert_eq!(FloatCodec::extract(&doc, "decimal"), 2.5);
    }

    #[test]
    fn test_storage_size_codec() {
        let doc = json!({"big": "10Gi", "small": "512Mi", "mixed": "1536Mi", "bad": "lots"});
        assert_eq!(StorageSizeCodec::extract(&doc, "big"), 10);
        assert_eq!(StorageSizeCodec::extract(&doc, "small"), 0);
        assert_eq!(StorageSizeCodec::extract(&doc, "mixed"), 1);
        assert_eq!(StorageSizeCodec::extract(&doc, "bad"), 0);
        assert_eq!(StorageSizeCodec::construct(&10).unwrap(), json!("10Gi"));
    }

    #[test]
    fn test_cores_codec() {
        let doc = doc();
        assert_eq!(CoresCodec::extract(&doc, "resources.cpu"), 0.5);
        assert_eq!(CoresCodec::extract(&doc, "resources.gpu"), 2.0);
        assert_eq!(CoresCodec::extract(&doc, "resources.broken"), 0.0);
        assert_eq!(CoresCodec::construct(&0.5).unwrap(), json!("0.5"));
        assert_eq!(CoresCodec::construct(&2.0).unwrap(), json!("2"));
    }

    #[test]
    fn test_storage_codec_round_trip() {
        let doc = doc();
        let spec = StorageCodec::extract(&doc, "storage").unwrap();
        assert_eq!(
            spec,
            StorageSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                storage_class: "gp2".to_string(),
                size: 10,
            }
        );

        let rebuilt = StorageCodec::construct(&Some(spec)).unwrap();
        assert_eq!(rebuilt, doc["storage"]);
        assert_eq!(
            rebuilt.to_string(),
            r#"{"accessModes":["ReadWriteOnce"],"storageClass":"gp2","size":"10Gi"}"#
        );
    }

    #[test]
    fn test_storage_codec_absent_and_malformed() {
        let doc = json!({"s": "not an object", "t": {"size": "huge"}});
        assert_eq!(StorageCodec::extract(&doc, "missing"), None);
        assert_eq!(StorageCodec::extract(&doc, "s"), None);
        assert_eq!(StorageCodec::extract(&doc, "t").unwrap().size, 0);
        assert_eq!(
            StorageCodec::extract(&json!({"u": {"storageClass": "ssd"}}), "u"),
            Some(StorageSpec {
                storage_class: "ssd".to_string(),
                ..Default::default()
            })
        );
        assert_eq!(StorageCodec::construct(&None).unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_raw_codec() {
        let doc = doc();
        assert_eq!(RawCodec::extract(&doc, "resources.gpu"), "2");
        assert_eq!(RawCodec::extract(&doc, "missing"), "");
        assert_eq!(RawCodec::construct(&String::new()).unwrap(), JsonValue::Null);
        assert_eq!(RawCodec::construct(&"\"x\"".to_string()).unwrap(), json!("x"));
        assert!(RawCodec::construct(&"{oops".to_string()).is_err());
    }

    #[test]
    fn test_float_construct_rejects_nan() {
        assert!(FloatCodec::construct(&f64::NAN).is_err());
    }

    #[test]
    fn test_kind_serde_tags() {
        let kinds: Vec<ConfigKind> =
            serde_json::from_str(r#"["string","int","boolean","kvPair","mystery"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![
                ConfigKind::String,
                ConfigKind::Int,
                ConfigKind::Boolean,
                ConfigKind::KvPair,
                ConfigKind::Unknown
            ]
        );
        assert_eq!(serde_json::to_string(&ConfigKind::KvPair).unwrap(), "\"kvPair\"");
        assert_eq!(serde_json::to_string(&kinds[4]).unwrap(), "\"unknown\"");
    }

    #[test]
    fn test_decode_checks_kind() {
        assert_eq!(
            ConfigKind::Int.decode("3").unwrap(),
            ParamValue::Int(3)
        );
        assert_eq!(ConfigKind::String.decode("\"a\"").unwrap(), ParamValue::String("a".into()));
        assert_eq!(ConfigKind::Boolean.decode("").unwrap(), ParamValue::Null);
        assert_eq!(
            ConfigKind::Json.decode(r#"{"a":1}"#).unwrap(),
            ParamValue::Structured(json!({"a": 1}))
        );
        assert!(ConfigKind::Int.decode("\"3\"").is_err());
        assert!(ConfigKind::Int.decode("1.5").is_err());
        assert!(ConfigKind::Boolean.decode("1").is_err());
    }

    #[test]
    fn test_encode_input() {
        assert_eq!(ConfigKind::String.encode_input("hello").unwrap(), "\"hello\"");
        assert_eq!(ConfigKind::Int.encode_input("42").unwrap(), "42");
        assert_eq!(ConfigKind::Float.encode_input("0.5").unwrap(), "0.5");
        assert_eq!(ConfigKind::Boolean.encode_input("True").unwrap(), "true");
        assert_eq!(ConfigKind::Json.encode_input(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
        assert_eq!(ConfigKind::Yaml.encode_input("a: 1").unwrap(), r#"{"a":1}"#);

        assert!(ConfigKind::Int.encode_input("four").is_err());
        assert!(ConfigKind::Boolean.encode_input("yes").is_err());
        assert!(ConfigKind::Json.encode_input("{nope").is_err());
    }
}
