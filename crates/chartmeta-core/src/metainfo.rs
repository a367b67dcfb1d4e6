//! Chart meta info schema
//!
//! The meta info describes which parts of a chart's values a user may
//! tune: top level parameters plus per-role bundles of base, resource and
//! health-check knobs. Every schema struct rejects unknown fields so that
//! a typo in the meta info surfaces at load time instead of silently
//! hiding a knob.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::codec::{
    BoolCodec, Codec, ConfigKind, CoresCodec, EnvCodec, IntCodec, MemoryCodec, RawCodec,
    StorageCodec, StorageSpec, StringCodec,
};
use crate::error::{CoreError, Result};

/// Chart meta info, the root of the schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChartMetaInfo {
    #[serde(default)]
    pub friendly_name: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<DependencyMetaInfo>,

    #[serde(default)]
    pub roles: Vec<RoleConfig>,

    /// Top level parameters
    #[serde(default)]
    pub params: Vec<CommonConfig>,

    #[serde(default)]
    pub plugins: Vec<PluginDescriptor>,

    /// Free-form parameters copied verbatim into extracted params
    #[serde(default)]
    pub custom_params: BTreeMap<String, String>,
}

impl ChartMetaInfo {
    /// Load meta info from a file, YAML unless the extension is `.json`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse meta info from YAML
    ///
    /// The YAML is converted to JSON first and then decoded strictly.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse meta info from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: JsonValue) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CoreError::InvalidMetaInfo {
            message: e.to_string(),
        })
    }

    /// Find a role by name
    pub fn role(&self, name: &str) -> Option<&RoleConfig> {
        self.roles.iter().find(|r| r.name == name)
    }
}

/// A dependency on another chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DependencyMetaInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_version: String,
    #[serde(default)]
    pub max_version: String,
    #[serde(default)]
    pub dependency_optional: bool,
    #[serde(default)]
    pub alias_config_var: String,
    #[serde(default)]
    pub chart_name: String,
    #[serde(default, rename = "type")]
    pub dependency_type: String,
}

impl DependencyMetaInfo {
    /// Whether the dependency can be resolved to the chart of the same name
    pub fn auto_dependency(&self) -> bool {
        !self.name.is_empty() && (self.chart_name.is_empty() || self.chart_name == self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub disable: bool,
}

/// A free-form parameter addressed by name in the flat list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommonConfig {
    pub name: String,

    #[serde(default)]
    pub map_key: String,

    /// Decoded value currently at `map_key`, or the declared default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConfigKind>,

    #[serde(default)]
    pub required: bool,
}

impl CommonConfig {
    /// Raw JSON text at `map_key`
    pub fn extract(&self, doc: &JsonValue) -> String {
        RawCodec::extract(doc, &self.map_key)
    }
}

/// A fixed knob bound to codec `C`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, bound = "")]
pub struct KnobConfig<C: Codec> {
    #[serde(default)]
    pub map_key: String,

    #[serde(default)]
    pub default_value: C::Value,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConfigKind>,

    #[serde(default)]
    pub required: bool,

    #[serde(skip)]
    codec: PhantomData<C>,
}

impl<C: Codec> KnobConfig<C> {
    pub fn new(map_key: impl Into<String>) -> Self {
        Self {
            map_key: map_key.into(),
            default_value: C::Value::default(),
            description: String::new(),
            kind: None,
            required: false,
            codec: PhantomData,
        }
    }

    /// Read this knob's live value from `doc`
    pub fn extract(&self, doc: &JsonValue) -> C::Value {
        C::extract(doc, &self.map_key)
    }

    /// JSON for `value`, ready to be spliced at `map_key`
    pub fn construct(&self, value: &C::Value) -> Result<JsonValue> {
        C::construct(value)
    }
}

impl<C: Codec> Default for KnobConfig<C> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<C: Codec> Clone for KnobConfig<C> {
    fn clone(&self) -> Self {
        Self {
            map_key: self.map_key.clone(),
            default_value: self.default_value.clone(),
            description: self.description.clone(),
            kind: self.kind,
            required: self.required,
            codec: PhantomData,
        }
    }
}

impl<C: Codec> PartialEq for KnobConfig<C> {
    fn eq(&self, other: &Self) -> bool {
        self.map_key == other.map_key
            && self.default_value == other.default_value
            && self.description == other.description
            && self.kind == other.kind
            && self.required == other.required
    }
}

impl<C: Codec> fmt::Debug for KnobConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnobConfig")
            .field("map_key", &self.map_key)
            .field("default_value", &self.default_value)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .finish()
    }
}

pub type StringConfig = KnobConfig<StringCodec>;
pub type IntConfig = KnobConfig<IntCodec>;
pub type BoolConfig = KnobConfig<BoolCodec>;
pub type EnvConfig = KnobConfig<EnvCodec>;
/// Memory in Mi
pub type MemoryConfig = KnobConfig<MemoryCodec>;
/// CPU or GPU in cores
pub type CoresConfig = KnobConfig<CoresCodec>;

/// A named bundle of knobs for one component of the chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoleConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type")]
    pub role_type: String,

    #[serde(default, rename = "baseConfig")]
    pub base: Option<RoleBaseConfig>,

    #[serde(default)]
    pub resources: Option<ResourceConfig>,

    #[serde(default, rename = "healthChecks")]
    pub health_checks: Option<HealthCheckConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoleBaseConfig {
    #[serde(default)]
    pub image: Option<StringConfig>,
    #[serde(default)]
    pub priority: Option<IntConfig>,
    #[serde(default)]
    pub replicas: Option<IntConfig>,
    #[serde(default)]
    pub env: Option<EnvConfig>,
    #[serde(default)]
    pub use_host_network: Option<BoolConfig>,
    #[serde(default)]
    pub others: Vec<CommonConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceConfig {
    #[serde(default)]
    pub limits_memory: Option<MemoryConfig>,
    #[serde(default)]
    pub limits_cpu: Option<CoresConfig>,
    #[serde(default)]
    pub limits_gpu: Option<CoresConfig>,
    #[serde(default)]
    pub requests_memory: Option<MemoryConfig>,
    #[serde(default)]
    pub requests_cpu: Option<CoresConfig>,
    #[serde(default)]
    pub requests_gpu: Option<CoresConfig>,
    #[serde(default)]
    pub storage_resources: Vec<StorageConfig>,
}

/// A named persistent volume request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StorageConfig {
    pub name: String,

    #[serde(default)]
    pub map_key: String,

    #[serde(default)]
    pub default_value: Option<StorageSpec>,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "type")]
    pub storage_type: String,

    #[serde(default)]
    pub required: bool,
}

impl StorageConfig {
    pub fn extract(&self, doc: &JsonValue) -> Option<StorageSpec> {
        StorageCodec::extract(doc, &self.map_key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HealthCheckConfig {
    #[serde(default)]
    pub readiness_probe: Option<HealthProbeConfig>,
    #[serde(default)]
    pub liveness_probe: Option<HealthProbeConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthProbeConfig {
    #[serde(default)]
    pub defined: bool,
    #[serde(default)]
    pub enable: bool,
}
