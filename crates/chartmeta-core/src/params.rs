//! Flat parameter values and their reconstruction into nested values
//!
//! `MetaInfoParams` is what clients see and edit. Each value mirrors a
//! schema entry from [`ChartMetaInfo`]; a field that is `None` means the
//! knob is not being set and leaves the nested document untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

use crate::codec::{
    BoolCodec, Codec, ConfigKind, CoresCodec, EnvCodec, EnvVar, IntCodec, MemoryCodec,
    ParamValue, RawCodec, StorageCodec, StorageSpec, StringCodec,
};
use crate::error::{CoreError, Result};
use crate::metainfo::{
    ChartMetaInfo, CommonConfig, KnobConfig, ResourceConfig, RoleBaseConfig, RoleConfig,
    StorageConfig,
};
use crate::path;
use crate::values::merge_values;

/// The flat, user-editable view of a chart's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfoParams {
    #[serde(default)]
    pub params: Vec<CommonConfigValue>,

    #[serde(default)]
    pub roles: Vec<RoleConfigValue>,

    #[serde(default, rename = "customParams")]
    pub custom_params: BTreeMap<String, String>,
}

/// One flat parameter on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonConfigValue {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConfigKind>,

    /// JSON text of the value; empty means "set to null"
    #[serde(default)]
    pub value: String,
}

impl CommonConfigValue {
    pub fn new(name: impl Into<String>, kind: Option<ConfigKind>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
        }
    }

    /// Build a parameter from a typed value
    pub fn from_typed(name: impl Into<String>, kind: ConfigKind, value: &ParamValue) -> Result<Self> {
        Ok(Self::new(name, Some(kind), value.to_raw()?))
    }

    /// Build a parameter from end-user text, encoded according to `kind`
    pub fn from_input(name: impl Into<String>, kind: ConfigKind, input: &str) -> Result<Self> {
        let name = name.into();
        let value = kind.encode_input(input).map_err(|e| with_param_name(e, &name))?;
        Ok(Self::new(name, Some(kind), value))
    }

    /// Decode the payload according to the declared kind
    ///
    /// Parameters without a kind decode as structured JSON.
    pub fn typed(&self) -> Result<ParamValue> {
        self.kind
            .unwrap_or(ConfigKind::Unknown)
            .decode(&self.value)
            .map_err(|e| with_param_name(e, &self.name))
    }
}

fn with_param_name(err: CoreError, param: &str) -> CoreError {
    match err {
        CoreError::InvalidParam { kind, message, .. } => CoreError::InvalidParam {
            name: param.to_string(),
            kind,
            message,
        },
        other => other,
    }
}

/// Live values for one role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleConfigValue {
    pub name: String,

    #[serde(default, rename = "baseConfig", skip_serializing_if = "Option::is_none")]
    pub base: Option<RoleBaseConfigValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceConfigValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBaseConfigValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_host_network: Option<bool>,
    #[serde(default)]
    pub others: Vec<CommonConfigValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfigValue {
    /// Mi
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits_memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits_cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits_gpu: Option<f64>,
    /// Mi
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_gpu: Option<f64>,
    #[serde(default)]
    pub storage_resources: Vec<StorageConfigValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfigValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<StorageSpec>,
}

impl MetaInfoParams {
    /// Rebuild the nested values document described by these params
    ///
    /// Parameters and roles are matched to `meta_info` by name; names the
    /// schema does not know are ignored. Partial documents are merged in
    /// order: top level params, then for each role its base config and
    /// its resources. Any write failure aborts the whole build.
    pub fn build_config_values(&self, meta_info: &ChartMetaInfo) -> Result<JsonValue> {
        let mut config_values = JsonValue::Object(serde_json::Map::new());

        let values = build_common_config_values(&self.params, &meta_info.params)?;
        merge_values(&mut config_values, &values, false)?;

        let roles: HashMap<&str, &RoleConfig> = meta_info
            .roles
            .iter()
            .map(|r| (r.name.as_str(), r))
            .collect();

        for role_value in &self.roles {
            let Some(role) = roles.get(role_value.name.as_str()) else {
                tracing::debug!("dropping values for unknown role {}", role_value.name);
                continue;
            };

            if let (Some(value), Some(config)) = (&role_value.base, &role.base) {
                let values = value.build_config_values(config)?;
                merge_values(&mut config_values, &values, false)?;
            }
            if let (Some(value), Some(config)) = (&role_value.resources, &role.resources) {
                let values = value.build_config_values(config)?;
                merge_values(&mut config_values, &values, false)?;
            }
        }

        Ok(config_values)
    }
}

fn build_common_config_values(
    config_values: &[CommonConfigValue],
    configs: &[CommonConfig],
) -> Result<JsonValue> {
    let configs: HashMap<&str, &CommonConfig> =
        configs.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut doc = JsonValue::Object(serde_json::Map::new());
    for config_value in config_values {
        let Some(config) = configs.get(config_value.name.as_str()) else {
            tracing::debug!("dropping unknown parameter {}", config_value.name);
            continue;
        };
        if config.map_key.is_empty() {
            continue;
        }

        let value = RawCodec::construct(&config_value.value)?;
        path::set(&mut doc, &config.map_key, value)?;
    }

    Ok(doc)
}

/// Splice `value` at the knob's map key when both the knob and the value exist
fn set_knob<C: Codec>(
    doc: &mut JsonValue,
    knob: &Option<KnobConfig<C>>,
    value: &Option<C::Value>,
) -> Result<()> {
    let (Some(knob), Some(value)) = (knob, value) else {
        return Ok(());
    };
    if knob.map_key.is_empty() {
        return Ok(());
    }

    path::set(doc, &knob.map_key, knob.construct(value)?)
}

impl RoleBaseConfigValue {
    pub fn build_config_values(&self, config: &RoleBaseConfig) -> Result<JsonValue> {
        let mut doc = JsonValue::Object(serde_json::Map::new());

        set_knob::<StringCodec>(&mut doc, &config.image, &self.image)?;
        set_knob::<BoolCodec>(&mut doc, &config.use_host_network, &self.use_host_network)?;
        set_knob::<IntCodec>(&mut doc, &config.priority, &self.priority)?;
        let env = self.env.as_ref().filter(|env| !env.is_empty()).cloned();
        set_knob::<EnvCodec>(&mut doc, &config.env, &env)?;
        set_knob::<IntCodec>(&mut doc, &config.replicas, &self.replicas)?;

        let others = build_common_config_values(&self.others, &config.others)?;
        merge_values(&mut doc, &others, false)?;

        Ok(doc)
    }
}

impl ResourceConfigValue {
    pub fn build_config_values(&self, config: &ResourceConfig) -> Result<JsonValue> {
        let mut doc = JsonValue::Object(serde_json::Map::new());

        set_knob::<MemoryCodec>(&mut doc, &config.limits_memory, &self.limits_memory)?;
        set_knob::<CoresCodec>(&mut doc, &config.limits_gpu, &self.limits_gpu)?;
        set_knob::<CoresCodec>(&mut doc, &config.limits_cpu, &self.limits_cpu)?;
        set_knob::<MemoryCodec>(&mut doc, &config.requests_memory, &self.requests_memory)?;
        set_knob::<CoresCodec>(&mut doc, &config.requests_gpu, &self.requests_gpu)?;
        set_knob::<CoresCodec>(&mut doc, &config.requests_cpu, &self.requests_cpu)?;

        let storages: HashMap<&str, &StorageConfig> = config
            .storage_resources
            .iter()
            .map(|s| (s.name.as_str(), s))
            .collect();

        for storage_value in &self.storage_resources {
            if storage_value.value.is_none() {
                continue;
            }
            let Some(storage) = storages.get(storage_value.name.as_str()) else {
                tracing::debug!("dropping unknown storage resource {}", storage_value.name);
                continue;
            };
            if storage.map_key.is_empty() {
                continue;
            }

            let value = StorageCodec::construct(&storage_value.value)?;
            path::set(&mut doc, &storage.map_key, value)?;
        }

        Ok(doc)
    }
}
