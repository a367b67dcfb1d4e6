//! Meta info lint
//!
//! Two passes. [`ChartMetaInfo::lint`] checks the schema itself and collects
//! one [`ValueCheck`] per declared knob; [`LintReport::check_values`] then
//! verifies a values document against those checks.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

use crate::codec::{Codec, ConfigKind};
use crate::metainfo::{ChartMetaInfo, CommonConfig, KnobConfig, RoleConfig};
use crate::path;
use crate::quantity::Quantity;

/// A single lint finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    /// Location in the meta info (`roles[0].baseConfig.image`) or a map key
    pub path: String,
    pub message: String,
}

impl LintIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// What a values document must hold at a map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expect {
    Boolean,
    String,
    Integer,
    Number,
    /// Object or array, null allowed
    Structured,
    /// Quantity string ending in `Mi` or `Gi`
    Memory,
    /// Core count as a number or quantity string
    Cpu,
    /// List of `{name, value}`, null allowed
    Env,
    /// Storage object, null allowed
    Storage,
    /// Presence only
    Any,
}

impl Expect {
    fn for_kind(kind: Option<ConfigKind>) -> Self {
        match kind {
            Some(ConfigKind::Boolean) => Expect::Boolean,
            Some(ConfigKind::String | ConfigKind::Text) => Expect::String,
            Some(ConfigKind::Int) => Expect::Integer,
            Some(ConfigKind::Float) => Expect::Number,
            Some(ConfigKind::Yaml | ConfigKind::Json | ConfigKind::KvPair) => Expect::Structured,
            Some(ConfigKind::Unknown) | None => Expect::Any,
        }
    }

    fn accepts(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (Expect::Any, _) => true,
            (Expect::Boolean, v) => v.is_boolean(),
            (Expect::String, v) => v.is_string(),
            (Expect::Integer, v) => v.is_i64() || v.is_u64(),
            (Expect::Number, v) => v.is_number(),
            (Expect::Structured | Expect::Env | Expect::Storage, JsonValue::Null) => true,
            (Expect::Structured, v) => v.is_object() || v.is_array(),
            (Expect::Memory, JsonValue::String(s)) => {
                (s.ends_with("Mi") || s.ends_with("Gi")) && Quantity::parse(s).is_ok()
            }
            (Expect::Memory, _) => false,
            (Expect::Cpu, JsonValue::Number(_)) => true,
            (Expect::Cpu, JsonValue::String(s)) => Quantity::parse(s).is_ok(),
            (Expect::Cpu, _) => false,
            (Expect::Env, JsonValue::Array(items)) => items
                .iter()
                .all(|item| item.get("name").is_some_and(JsonValue::is_string)),
            (Expect::Env, _) => false,
            (Expect::Storage, v) => v.is_object(),
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Expect::Boolean => "boolean",
            Expect::String => "string",
            Expect::Integer => "integer",
            Expect::Number => "number",
            Expect::Structured => "object or array",
            Expect::Memory => "memory quantity (eg: 4Gi, 400Mi)",
            Expect::Cpu => "cpu quantity",
            Expect::Env => "env list",
            Expect::Storage => "storage object",
            Expect::Any => "any value",
        };
        f.write_str(name)
    }
}

/// A type check against one map key of a values document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCheck {
    pub map_key: String,
    pub required: bool,
    pub expect: Expect,
}

impl ValueCheck {
    pub fn check(&self, doc: &JsonValue) -> Option<LintIssue> {
        match path::get(doc, &self.map_key) {
            None if self.required => {
                Some(LintIssue::new(&self.map_key, "required key not found in values"))
            }
            None => None,
            Some(value) if !self.expect.accepts(value) => Some(LintIssue::new(
                &self.map_key,
                format!("type error in values, {} expected", self.expect),
            )),
            Some(_) => None,
        }
    }
}

/// Findings of a meta info lint run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub issues: Vec<LintIssue>,
    pub checks: Vec<ValueCheck>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Run every collected check against `doc`
    pub fn check_values(&self, doc: &JsonValue) -> Vec<LintIssue> {
        self.checks.iter().filter_map(|c| c.check(doc)).collect()
    }

    fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(LintIssue::new(path, message));
    }

    fn knob<C: Codec>(&mut self, at: &str, knob: &Option<KnobConfig<C>>, expect: Expect) {
        let Some(knob) = knob else {
            return;
        };
        if knob.map_key.is_empty() {
            self.issue(at, "mapKey required");
            return;
        }
        self.checks.push(ValueCheck {
            map_key: knob.map_key.clone(),
            required: knob.required,
            expect,
        });
    }

    fn common(&mut self, at: &str, config: &CommonConfig) {
        let before = self.issues.len();
        if config.name.is_empty() {
            self.issue(at, "name required");
        }
        if config.map_key.is_empty() {
            self.issue(at, "mapKey required");
        }
        match config.kind {
            None => self.issue(at, "type required"),
            Some(ConfigKind::Unknown) => self.issue(at, "type not supported"),
            Some(_) => {}
        }

        if self.issues.len() == before {
            self.checks.push(ValueCheck {
                map_key: config.map_key.clone(),
                required: config.required,
                expect: Expect::for_kind(config.kind),
            });
        }
    }

    fn role(&mut self, index: usize, role: &RoleConfig) {
        let at = format!("roles[{}]", index);
        if role.name.is_empty() {
            self.issue(&at, "name required");
        }
        if role.role_type.is_empty() {
            self.issue(&at, "type required");
        }

        if let Some(base) = &role.base {
            let at = format!("{}.baseConfig", at);
            self.knob(&format!("{}.image", at), &base.image, Expect::String);
            self.knob(&format!("{}.priority", at), &base.priority, Expect::Integer);
            self.knob(&format!("{}.replicas", at), &base.replicas, Expect::Integer);
            self.knob(&format!("{}.env", at), &base.env, Expect::Env);
            self.knob(
                &format!("{}.useHostNetwork", at),
                &base.use_host_network,
                Expect::Boolean,
            );
            for (i, other) in base.others.iter().enumerate() {
                self.common(&format!("{}.others[{}]", at, i), other);
            }
        }

        if let Some(resources) = &role.resources {
            let at = format!("{}.resources", at);
            self.knob(&format!("{}.limitsCpu", at), &resources.limits_cpu, Expect::Cpu);
            self.knob(
                &format!("{}.limitsMemory", at),
                &resources.limits_memory,
                Expect::Memory,
            );
            self.knob(&format!("{}.limitsGpu", at), &resources.limits_gpu, Expect::Cpu);
            self.knob(
                &format!("{}.requestsMemory", at),
                &resources.requests_memory,
                Expect::Memory,
            );
            self.knob(&format!("{}.requestsCpu", at), &resources.requests_cpu, Expect::Cpu);
            self.knob(&format!("{}.requestsGpu", at), &resources.requests_gpu, Expect::Cpu);

            for (i, storage) in resources.storage_resources.iter().enumerate() {
                let at = format!("{}.storageResources[{}]", at, i);
                let before = self.issues.len();
                if storage.name.is_empty() {
                    self.issue(&at, "name required");
                }
                if storage.map_key.is_empty() {
                    self.issue(&at, "mapKey required");
                }
                if self.issues.len() == before {
                    self.checks.push(ValueCheck {
                        map_key: storage.map_key.clone(),
                        required: storage.required,
                        expect: Expect::Storage,
                    });
                }
            }
        }
    }
}

impl ChartMetaInfo {
    /// Check the meta info for missing or unsupported fields
    pub fn lint(&self) -> LintReport {
        let mut report = LintReport::default();

        if self.friendly_name.is_empty() {
            report.issue("friendlyName", "friendlyName required");
        }

        for (i, dep) in self.dependencies.iter().enumerate() {
            let at = format!("dependencies[{}]", i);
            for (field, value) in [
                ("name", &dep.name),
                ("minVersion", &dep.min_version),
                ("maxVersion", &dep.max_version),
                ("aliasConfigVar", &dep.alias_config_var),
            ] {
                if value.is_empty() {
                    report.issue(&at, format!("{} required", field));
                }
            }
        }

        for (i, role) in self.roles.iter().enumerate() {
            report.role(i, role);
        }

        for (i, param) in self.params.iter().enumerate() {
            report.common(&format!("params[{}]", i), param);
        }

        for (i, plugin) in self.plugins.iter().enumerate() {
            let at = format!("plugins[{}]", i);
            for (field, value) in [
                ("name", &plugin.name),
                ("version", &plugin.version),
                ("args", &plugin.args),
            ] {
                if value.is_empty() {
                    report.issue(&at, format!("{} required", field));
                }
            }
        }

        report
    }
}
