//! The generated control manifest.
//!
//! Field names and nesting are the wire contract with the cache runtime and
//! must not change without bumping [`CONFIG_VERSION`].

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use swgen_config::{CacheQueryOptions, InstallMode, Strategy};

/// Schema version of the manifest. Runtimes refuse manifests with a version
/// they do not understand.
pub const CONFIG_VERSION: u32 = 1;

/// Cache query options with the generator's defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCacheQueryOptions {
    pub ignore_vary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_search: Option<bool>,
}

impl From<Option<CacheQueryOptions>> for ResolvedCacheQueryOptions {
    /// `ignoreVary` defaults to `true`; explicit options win.
    fn from(options: Option<CacheQueryOptions>) -> Self {
        let options = options.unwrap_or_default();
        Self {
            ignore_vary: options.ignore_vary.unwrap_or(true),
            ignore_search: options.ignore_search,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupManifest {
    pub name: String,
    pub install_mode: InstallMode,
    pub update_mode: InstallMode,
    pub cache_query_options: ResolvedCacheQueryOptions,
    /// Absolute URLs of the build output files claimed by this group, sorted.
    pub urls: Vec<String>,
    /// Anchored regular expressions for runtime-matched URLs.
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGroupManifest {
    pub name: String,
    pub patterns: Vec<String>,
    pub strategy: Strategy,
    pub max_size: u64,
    /// Milliseconds.
    pub max_age: u64,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_opaque_responses: Option<bool>,
    pub cache_query_options: ResolvedCacheQueryOptions,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationUrl {
    pub positive: bool,
    pub regex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub config_version: u32,
    /// Milliseconds since the Unix epoch at generation time.
    pub timestamp: u64,
    /// Omitted when [`None`]; `Some(Value::Null)` is written as `null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub app_data: Option<serde_json::Value>,
    pub index: String,
    pub asset_groups: Vec<AssetGroupManifest>,
    pub data_groups: Vec<DataGroupManifest>,
    /// Absolute URL to content hash. A [`BTreeMap`] keeps keys sorted, which
    /// keeps the serialized manifest byte-stable.
    pub hash_table: BTreeMap<String, String>,
    pub navigation_urls: Vec<NavigationUrl>,
    pub navigation_request_strategy: Strategy,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl Manifest {
    /// Pretty-printed JSON, as written next to the build output.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).or_raise(|| ErrorKind::Serialize)
    }
}
