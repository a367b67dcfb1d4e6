//! Reading flat params and defaults out of a nested values document
//!
//! Both walks are lenient: a knob whose data is missing or malformed reads
//! as its zero value and never aborts the walk.

use serde_json::Value as JsonValue;

use crate::codec::{Codec, RawCodec};
use crate::metainfo::{
    ChartMetaInfo, CommonConfig, KnobConfig, ResourceConfig, RoleBaseConfig, RoleConfig,
};
use crate::params::{
    CommonConfigValue, MetaInfoParams, ResourceConfigValue, RoleBaseConfigValue,
    RoleConfigValue, StorageConfigValue,
};

fn extract_knob<C: Codec>(knob: &Option<KnobConfig<C>>, doc: &JsonValue) -> Option<C::Value> {
    knob.as_ref().map(|k| k.extract(doc))
}

fn refresh_knob<C: Codec>(knob: &mut Option<KnobConfig<C>>, doc: &JsonValue) {
    if let Some(knob) = knob {
        knob.default_value = knob.extract(doc);
    }
}

impl ChartMetaInfo {
    /// Read the flat parameter view of `doc`
    ///
    /// Params keep their declared order. A role value carries a base or
    /// resource bundle only where the schema declares one.
    pub fn build_params(&self, doc: &JsonValue) -> MetaInfoParams {
        MetaInfoParams {
            params: self.params.iter().map(|p| p.build_value(doc)).collect(),
            roles: self.roles.iter().map(|r| r.build_value(doc)).collect(),
            custom_params: self.custom_params.clone(),
        }
    }

    /// Replace every schema default with what `doc` currently holds
    pub fn build_default_value(&mut self, doc: &JsonValue) {
        if doc.is_null() {
            return;
        }

        for param in &mut self.params {
            param.build_default_value(doc);
        }
        for role in &mut self.roles {
            role.build_default_value(doc);
        }
    }
}

impl CommonConfig {
    pub fn build_value(&self, doc: &JsonValue) -> CommonConfigValue {
        CommonConfigValue::new(&self.name, self.kind, self.extract(doc))
    }

    pub fn build_default_value(&mut self, doc: &JsonValue) {
        let raw = self.extract(doc);
        self.default_value = match RawCodec::construct(&raw) {
            Ok(JsonValue::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("failed to decode default for {}: {}", self.name, e);
                None
            }
        };
    }
}

impl RoleConfig {
    pub fn build_value(&self, doc: &JsonValue) -> RoleConfigValue {
        RoleConfigValue {
            name: self.name.clone(),
            base: self.base.as_ref().map(|b| b.build_value(doc)),
            resources: self.resources.as_ref().map(|r| r.build_value(doc)),
        }
    }

    pub fn build_default_value(&mut self, doc: &JsonValue) {
        if let Some(base) = &mut self.base {
            base.build_default_value(doc);
        }
        if let Some(resources) = &mut self.resources {
            resources.build_default_value(doc);
        }
    }
}

impl RoleBaseConfig {
    pub fn build_value(&self, doc: &JsonValue) -> RoleBaseConfigValue {
        RoleBaseConfigValue {
            image: extract_knob(&self.image, doc),
            priority: extract_knob(&self.priority, doc),
            replicas: extract_knob(&self.replicas, doc),
            env: extract_knob(&self.env, doc),
            use_host_network: extract_knob(&self.use_host_network, doc),
            others: self.others.iter().map(|o| o.build_value(doc)).collect(),
        }
    }

    pub fn build_default_value(&mut self, doc: &JsonValue) {
        refresh_knob(&mut self.image, doc);
        refresh_knob(&mut self.replicas, doc);
        refresh_knob(&mut self.env, doc);
        refresh_knob(&mut self.use_host_network, doc);
        refresh_knob(&mut self.priority, doc);
        for other in &mut self.others {
            other.build_default_value(doc);
        }
    }
}

impl ResourceConfig {
    pub fn build_value(&self, doc: &JsonValue) -> ResourceConfigValue {
        ResourceConfigValue {
            limits_memory: extract_knob(&self.limits_memory, doc),
            limits_cpu: extract_knob(&self.limits_cpu, doc),
            limits_gpu: extract_knob(&self.limits_gpu, doc),
            requests_memory: extract_knob(&self.requests_memory, doc),
            requests_cpu: extract_knob(&self.requests_cpu, doc),
            requests_gpu: extract_knob(&self.requests_gpu, doc),
            storage_resources: self
                .storage_resources
                .iter()
                .map(|s| StorageConfigValue {
                    name: s.name.clone(),
                    value: s.extract(doc),
                })
                .collect(),
        }
    }

    pub fn build_default_value(&mut self, doc: &JsonValue) {
        refresh_knob(&mut self.limits_memory, doc);
        refresh_knob(&mut self.limits_gpu, doc);
        refresh_knob(&mut self.limits_cpu, doc);
        refresh_knob(&mut self.requests_memory, doc);
        refresh_knob(&mut self.requests_gpu, doc);
        refresh_knob(&mut self.requests_cpu, doc);
        for storage in &mut self.storage_resources {
            storage.default_value = storage.extract(doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ConfigKind, EnvVar, StorageSpec};
    use serde_json::json;

    const META_INFO: &str = r#"
friendlyName: demo
params:
  - name: command
    mapKey: image.java.command
    type: string
  - name: settings
    mapKey: settings
    type: json
  - name: missing
    mapKey: not.there
    type: int
customParams:
  owner: team-a
roles:
  - name: server
    type: Deployment
    baseConfig:
      image:
        mapKey: image.application.image
      replicas:
        mapKey: replicas
      env:
        mapKey: envs
      useHostNetwork:
        mapKey: useHostNetwork
      others:
        - name: logLevel
          mapKey: server.logLevel
          type: string
    resources:
      limitsMemory:
        mapKey: resources.limits.memory
      limitsCpu:
        mapKey: resources.limits.cpu
      requestsCpu:
        mapKey: resources.requests.cpu
      storageResources:
        - name: data
          mapKey: persistence.data
  - name: sidecar
    type: Deployment
"#;

    fn values() -> JsonValue {
        json!({
            "image": {
                "java": {"command": "run"},
                "application": {"image": "demo:1.0"}
            },
            "settings": {"a": 1},
            "replicas": 3,
            "envs": [{"name": "MODE", "value": "fast"}],
            "useHostNetwork": false,
            "server": {"logLevel": "debug"},
            "resources": {
                "limits": {"memory": "2Gi", "cpu": "1500m"},
                "requests": {"cpu": "garbage"}
            },
            "persistence": {
                "data": {"accessModes": ["ReadWriteOnce"], "storageClass": "ssd", "size": "20Gi"}
            }
        })
    }

    #[test]
    fn test_build_params() {
        let meta = ChartMetaInfo::from_yaml(META_INFO).unwrap();
        let params = meta.build_params(&values());

        assert_eq!(
            params.params,
            vec![
                CommonConfigValue::new("command", Some(ConfigKind::String), "\"run\""),
                CommonConfigValue::new("settings", Some(ConfigKind::Json), r#"{"a":1}"#),
                CommonConfigValue::new("missing", Some(ConfigKind::Int), ""),
            ]
        );
        assert_eq!(params.custom_params["owner"], "team-a");

        let server = &params.roles[0];
        let base = server.base.as_ref().unwrap();
        assert_eq!(base.image.as_deref(), Some("demo:1.0"));
        assert_eq!(base.replicas, Some(3));
        assert_eq!(base.priority, None);
        assert_eq!(base.env, Some(vec![EnvVar::new("MODE", "fast")]));
        assert_eq!(base.use_host_network, Some(false));
        assert_eq!(base.others[0].value, "\"debug\"");

        let resources = server.resources.as_ref().unwrap();
        assert_eq!(resources.limits_memory, Some(2048));
        assert_eq!(resources.limits_cpu, Some(1.5));
        assert_eq!(resources.requests_cpu, Some(0.0));
        assert_eq!(resources.limits_gpu, None);
        assert_eq!(
            resources.storage_resources[0].value,
            Some(StorageSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                storage_class: "ssd".to_string(),
                size: 20,
            })
        );

        let sidecar = &params.roles[1];
        assert!(sidecar.base.is_none() && sidecar.resources.is_none());
    }

    #[test]
    fn test_extract_then_construct_is_stable() {
        let meta = ChartMetaInfo::from_yaml(META_INFO).unwrap();
        let doc = json!({
            "image": {"java": {"command": "run"}, "application": {"image": "demo:1.0"}},
            "settings": {"a": 1},
            "replicas": 3,
            "envs": [{"name": "MODE", "value": "fast"}],
            "useHostNetwork": true,
            "server": {"logLevel": "debug"},
            "resources": {"limits": {"memory": "512Mi", "cpu": "0.5"}, "requests": {"cpu": "2"}},
            "persistence": {"data": {"accessModes": ["ReadWriteOnce"], "storageClass": "ssd", "size": "20Gi"}}
        });

        let params = meta.build_params(&doc);
        let rebuilt = params.build_config_values(&meta).unwrap();

        let mut expected = doc.clone();
        expected["not"] = json!({"there": null});
        assert_eq!(rebuilt, expected);

        let again = meta.build_params(&rebuilt);
        assert_eq!(again.roles, params.roles);
        assert_eq!(again.params[..2], params.params[..2]);
        assert_eq!(again.params[2].value, "null");
    }

    #[test]
    fn test_numeric_map_keys_do_not_index_lists() {
        let meta = ChartMetaInfo::from_yaml(
            r#"
params:
  - name: first
    mapKey: list.0
    type: string
  - name: port
    mapKey: ports.0
    type: string
"#,
        )
        .unwrap();

        let params = meta.build_params(&json!({"list": ["a", "b"], "ports": {"0": "http"}}));
        assert_eq!(params.params[0].value, "");
        assert_eq!(params.params[1].value, "\"http\"");

        let port_only = MetaInfoParams {
            params: params.params[1..].to_vec(),
            ..Default::default()
        };
        let rebuilt = port_only.build_config_values(&meta).unwrap();
        assert_eq!(rebuilt, json!({"ports": {"0": "http"}}));
    }

    #[test]
    fn test_build_default_value() {
        let mut meta = ChartMetaInfo::from_yaml(META_INFO).unwrap();
        meta.build_default_value(&values());

        assert_eq!(meta.params[0].default_value, Some(json!("run")));
        assert_eq!(meta.params[1].default_value, Some(json!({"a": 1})));
        assert_eq!(meta.params[2].default_value, None);

        let role = meta.role("server").unwrap();
        let base = role.base.as_ref().unwrap();
        assert_eq!(base.image.as_ref().unwrap().default_value, "demo:1.0");
        assert_eq!(base.replicas.as_ref().unwrap().default_value, 3);
        assert_eq!(base.others[0].default_value, Some(json!("debug")));

        let resources = role.resources.as_ref().unwrap();
        assert_eq!(resources.limits_memory.as_ref().unwrap().default_value, 2048);
        assert_eq!(resources.storage_resources[0].default_value.as_ref().unwrap().size, 20);

        let snapshot = meta.clone();
        meta.build_default_value(&values());
        assert_eq!(meta, snapshot);
    }

    #[test]
    fn test_build_default_value_ignores_null_doc() {
        let mut meta = ChartMetaInfo::from_yaml(META_INFO).unwrap();
        meta.params[0].default_value = Some(json!("keep"));
        let snapshot = meta.clone();

        meta.build_default_value(&JsonValue::Null);
        assert_eq!(meta, snapshot);
    }
}
