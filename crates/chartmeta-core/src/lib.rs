//! Chartmeta Core - Chart meta info schema and config value mapping
//!
//! This crate provides the two-way mapping between a chart's nested values
//! document and the flat, typed parameter list described by its meta info:
//! - `ChartMetaInfo`: The schema (params, roles, resources, storage)
//! - `MetaInfoParams`: The flat parameter view users edit
//! - `Values`: Configuration values with deep merge support
//! - `codec`: Per-knob extract/construct pairs, including resource quantities
//! - `lint`: Schema checks and values type checks

pub mod codec;
pub mod error;
pub mod extract;
pub mod lint;
pub mod metainfo;
pub mod params;
pub mod path;
pub mod quantity;
pub mod values;

pub use codec::{Codec, ConfigKind, EnvVar, ParamValue, StorageSpec};
pub use error::{CoreError, Result};
pub use lint::{Expect, LintIssue, LintReport, ValueCheck};
pub use metainfo::{
    ChartMetaInfo, CommonConfig, DependencyMetaInfo, HealthCheckConfig, KnobConfig,
    PluginDescriptor, ResourceConfig, RoleBaseConfig, RoleConfig, StorageConfig,
};
pub use params::{
    CommonConfigValue, MetaInfoParams, ResourceConfigValue, RoleBaseConfigValue,
    RoleConfigValue, StorageConfigValue,
};
pub use quantity::Quantity;
pub use values::{Values, merge_values, parse_set_values};
