//! The service worker configuration document.
//!
//! Mirrors the JSON shape of `ngsw-config.json`. Field names are camelCase on
//! the wire. Defaults that depend on other fields (an asset group's update
//! mode falling back to its install mode, for instance) are left as [`None`]
//! here and resolved by the generator.

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Format, Json};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// When the resources of an asset group are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Fetch every resource up front.
    #[default]
    Prefetch,
    /// Fetch resources only when they are requested.
    Lazy,
}

/// Caching strategy of a data group, also used for navigation requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Prefer the network, fall back to the cache.
    Freshness,
    /// Prefer the cache.
    #[default]
    Performance,
}

/// Subset of the Cache API's `CacheQueryOptions` that the runtime honours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheQueryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_vary: Option<bool>,
}

/// Resources of an asset group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResources {
    /// Globs over the files of the build output.
    #[serde(default)]
    pub files: Vec<String>,
    /// Globs over URLs that are matched at runtime.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Legacy option. Accepted by the parser only so that its presence can be
    /// reported; any value is rejected by the generator.
    #[serde(default)]
    pub versioned_files: Option<serde_json::Value>,
}

/// A named bucket of static build output files plus runtime URL patterns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    pub name: String,
    #[serde(default)]
    pub install_mode: Option<InstallMode>,
    #[serde(default)]
    pub update_mode: Option<InstallMode>,
    #[serde(default)]
    pub resources: AssetResources,
    #[serde(default)]
    pub cache_query_options: Option<CacheQueryOptions>,
}

/// Eviction and freshness policy of a data group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    pub max_size: u64,
    /// Duration string, e.g. `"3d12h"`.
    pub max_age: String,
    /// Duration string, network timeout for the `freshness` strategy.
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub cache_opaque_responses: Option<bool>,
}

/// A named bucket of runtime-fetched resources.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGroup {
    pub name: String,
    pub urls: Vec<String>,
    #[serde(default)]
    pub version: Option<u32>,
    pub cache_config: CacheConfig,
    #[serde(default)]
    pub cache_query_options: Option<CacheQueryOptions>,
}

/// The whole configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Opaque application data, copied into the manifest verbatim. An
    /// explicit `null` is kept as `Some(Value::Null)`; only a missing key is
    /// [`None`].
    #[serde(default, deserialize_with = "present")]
    pub app_data: Option<serde_json::Value>,
    pub index: String,
    #[serde(default)]
    pub asset_groups: Vec<AssetGroup>,
    #[serde(default)]
    pub data_groups: Vec<DataGroup>,
    /// [`None`] selects the built-in navigation URL patterns.
    #[serde(default)]
    pub navigation_urls: Option<Vec<String>>,
    #[serde(default)]
    pub navigation_request_strategy: Option<Strategy>,
}

/// Wraps whatever value is present, `null` included, in [`Some`].
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl Config {
    /// Loads a configuration document from a JSON file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            _ => ErrorKind::Unreadable(path.to_path_buf()),
        })?;
        let config: Self = text.parse()?;
        tracing::debug!(
            asset_groups = config.asset_groups.len(),
            data_groups = config.data_groups.len(),
            "Loaded configuration document"
        );
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = crate::error::Error;

    /// Parses a configuration document from JSON text.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Figment::from(Json::string(s))
            .extract::<Self>()
            .map_err(|e| ErrorKind::InvalidDocument(e.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: &str = r#"{
        "appData": {"release": "2024.1", "flags": [1, 2]},
        "index": "/index.html",
        "assetGroups": [{
            "name": "app",
            "installMode": "prefetch",
            "updateMode": "lazy",
            "resources": {"files": ["/favicon.ico", "/*.js"], "urls": ["https://fonts.example.com/**"]},
            "cacheQueryOptions": {"ignoreSearch": true}
        }],
        "dataGroups": [{
            "name": "api",
            "urls": ["/api/**"],
            "version": 2,
            "cacheConfig": {
                "maxSize": 100,
                "maxAge": "3d",
                "timeout": "10s",
                "strategy": "freshness",
                "cacheOpaqueResponses": false
            }
        }],
        "navigationUrls": ["/**", "!/**/*.*"],
        "navigationRequestStrategy": "freshness"
    }"#;

    #[test]
    fn test_parse_full_document() {
        let config: Config = FULL.parse().unwrap();
        assert_eq!(config.index, "/index.html");
        assert_eq!(config.app_data.as_ref().unwrap()["release"], "2024.1");

        let app = &config.asset_groups[0];
        assert_eq!(app.name, "app");
        assert_eq!(app.install_mode, Some(InstallMode::Prefetch));
        assert_eq!(app.update_mode, Some(InstallMode::Lazy));
        assert_eq!(app.resources.files, ["/favicon.ico", "/*.js"]);
        assert_eq!(app.resources.urls, ["https://fonts.example.com/**"]);
        assert!(app.resources.versioned_files.is_none());
        assert_eq!(app.cache_query_options.unwrap().ignore_search, Some(true));

        let api = &config.data_groups[0];
        assert_eq!(api.version, Some(2));
        assert_eq!(api.cache_config.max_size, 100);
        assert_eq!(api.cache_config.max_age, "3d");
        assert_eq!(api.cache_config.timeout.as_deref(), Some("10s"));
        assert_eq!(api.cache_config.strategy, Some(Strategy::Freshness));
        assert_eq!(api.cache_config.cache_opaque_responses, Some(false));

        assert_eq!(config.navigation_urls.as_deref().unwrap(), ["/**", "!/**/*.*"]);
        assert_eq!(config.navigation_request_strategy, Some(Strategy::Freshness));
    }

    #[test]
    fn test_parse_minimal_document() {
        let config: Config = r#"{"index": "/index.html"}"#.parse().unwrap();
        assert!(config.app_data.is_none());
    }

    #[test]
    fn test_explicit_null_app_data_is_kept() {
        let config: Config = r#"{"index": "/index.html", "appData": null}"#.parse().unwrap();
        assert_eq!(config.app_data, Some(serde_json::Value::Null));
        assert!(config.asset_groups.is_empty());
        assert!(config.data_groups.is_empty());
        assert!(config.navigation_urls.is_none());
        assert!(config.navigation_request_strategy.is_none());
    }

    #[test]
    fn test_asset_group_defaults() {
        let config: Config = r#"{"index": "/index.html", "assetGroups": [{"name": "empty"}]}"#.parse().unwrap();
        let group = &config.asset_groups[0];
        assert!(group.install_mode.is_none());
        assert!(group.update_mode.is_none());
        assert!(group.resources.files.is_empty());
        assert!(group.resources.urls.is_empty());
    }

    #[test]
    fn test_versioned_files_is_preserved_for_rejection() {
        let config: Config =
            r#"{"index": "/index.html", "assetGroups": [{"name": "old", "resources": {"versionedFiles": []}}]}"#
                .parse()
                .unwrap();
        assert!(config.asset_groups[0].resources.versioned_files.is_some());
    }

    #[rstest]
    #[case::missing_index(r#"{"assetGroups": []}"#)]
    #[case::unknown_install_mode(r#"{"index": "/", "assetGroups": [{"name": "a", "installMode": "eager"}]}"#)]
    #[case::missing_cache_config(r#"{"index": "/", "dataGroups": [{"name": "d", "urls": []}]}"#)]
    #[case::negative_max_size(
        r#"{"index": "/", "dataGroups": [{"name": "d", "urls": [], "cacheConfig": {"maxSize": -1, "maxAge": "1d"}}]}"#
    )]
    #[case::not_json("index: /index.html")]
    fn test_invalid_documents(#[case] text: &str) {
        let err = text.parse::<Config>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidDocument(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngsw-config.json");
        std::fs::write(&path, FULL).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.asset_groups.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }
}
