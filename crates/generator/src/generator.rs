use crate::duration::parse_duration;
use crate::error::{ErrorKind, Result};
use crate::glob::GlobList;
use crate::manifest::{AssetGroupManifest, CONFIG_VERSION, DataGroupManifest, Manifest, NavigationUrl};
use crate::url::{join_urls, url_to_glob};
use exn::ResultExt;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use swgen_asyncutils::try_in_batches;
use swgen_config::{AssetGroup, Config, DataGroup};
use swgen_storage::{BackendHandle, FileInfo, StorageBackend};
use tracing::instrument;

/// Maximum number of hash calls in flight at once.
pub const HASH_BATCH_SIZE: usize = 500;

/// Navigation URLs used when the configuration declares none: every path,
/// except ones that look like files (`*.*`) or contain a double underscore.
pub const DEFAULT_NAVIGATION_URLS: [&str; 4] = ["/**", "!/**/*.*", "!/**/*__*", "!/**/*__*/**"];

/// Asset group with its file globs compiled.
struct CompiledAssetGroup<'a> {
    group: &'a AssetGroup,
    files: GlobList,
}

/// Builds [`Manifest`]s for one build output tree.
pub struct Generator {
    backend: BackendHandle,
    base_href: String,
}

impl Generator {
    pub fn new(backend: BackendHandle, base_href: impl Into<String>) -> Self {
        Self { backend, base_href: base_href.into() }
    }

    /// Generates the manifest for `config`.
    ///
    /// The whole configuration is validated before the backend is touched:
    /// a configuration error never lists or hashes a single file. The build
    /// output is listed exactly once and every file claimed by an asset group
    /// is hashed, at most [`HASH_BATCH_SIZE`] at a time. Any hashing failure
    /// fails the whole generation.
    #[instrument(skip(self, config), fields(backend = self.backend.name(), base_href = %self.base_href))]
    pub async fn process(&self, config: &Config) -> Result<Manifest> {
        check_unique_names(config)?;
        let compiled = config.asset_groups.iter().map(compile_asset_group).collect::<Result<Vec<_>>>()?;
        let asset_manifests = config
            .asset_groups
            .iter()
            .map(|group| self.asset_group_manifest(group))
            .collect::<Result<Vec<_>>>()?;
        let data_groups =
            config.data_groups.iter().map(|group| self.data_group_manifest(group)).collect::<Result<Vec<_>>>()?;
        let navigation_urls = self.navigation_urls(config.navigation_urls.as_deref())?;

        let files = self.list_files().await?;
        let claimed = assign_files(&compiled, &files);
        let asset_groups = asset_manifests
            .into_iter()
            .zip(&claimed)
            .map(|(manifest, urls)| AssetGroupManifest {
                urls: urls.iter().map(|file| join_urls(&self.base_href, file)).collect(),
                ..manifest
            })
            .collect();
        let hash_table = self.hash_files(claimed.into_iter().flatten()).await?;

        let manifest = Manifest {
            config_version: CONFIG_VERSION,
            timestamp: now_millis(),
            app_data: config.app_data.clone(),
            index: join_urls(&self.base_href, &config.index),
            asset_groups,
            data_groups,
            hash_table,
            navigation_urls,
            navigation_request_strategy: config.navigation_request_strategy.unwrap_or_default(),
        };
        tracing::info!(
            asset_groups = manifest.asset_groups.len(),
            data_groups = manifest.data_groups.len(),
            files = manifest.hash_table.len(),
            "Generated manifest"
        );
        Ok(manifest)
    }

    /// Everything of an asset group's manifest entry except its file URLs.
    fn asset_group_manifest(&self, group: &AssetGroup) -> Result<AssetGroupManifest> {
        let patterns = group
            .resources
            .urls
            .iter()
            .map(|url| -> Result<String> { Ok(url_to_glob(url, &self.base_href, true)?.as_regex_str().to_string()) })
            .collect::<Result<Vec<_>>>()
            .or_raise(|| ErrorKind::AssetGroup(group.name.clone()))?;
        let install_mode = group.install_mode.unwrap_or_default();
        Ok(AssetGroupManifest {
            name: group.name.clone(),
            install_mode,
            update_mode: group.update_mode.unwrap_or(install_mode),
            cache_query_options: group.cache_query_options.into(),
            urls: Vec::new(),
            patterns,
        })
    }

    fn data_group_manifest(&self, group: &DataGroup) -> Result<DataGroupManifest> {
        let context = || ErrorKind::DataGroup(group.name.clone());
        let patterns = group
            .urls
            .iter()
            .map(|url| -> Result<String> { Ok(url_to_glob(url, &self.base_href, true)?.as_regex_str().to_string()) })
            .collect::<Result<Vec<_>>>()
            .or_raise(context)?;
        let cache = &group.cache_config;
        let max_age = parse_duration(&cache.max_age).or_raise(context)?;
        let timeout_ms = cache.timeout.as_deref().map(parse_duration).transpose().or_raise(context)?;
        Ok(DataGroupManifest {
            name: group.name.clone(),
            patterns,
            strategy: cache.strategy.unwrap_or_default(),
            max_size: cache.max_size,
            max_age,
            timeout_ms,
            cache_opaque_responses: cache.cache_opaque_responses,
            cache_query_options: group.cache_query_options.into(),
            version: group.version.unwrap_or(1),
        })
    }

    fn navigation_urls(&self, urls: Option<&[String]>) -> Result<Vec<NavigationUrl>> {
        let compile = |url: &str| -> Result<NavigationUrl> {
            let (positive, body) = match url.strip_prefix('!') {
                Some(body) => (false, body),
                None => (true, url),
            };
            let glob = url_to_glob(body, &self.base_href, false)
                .or_raise(|| ErrorKind::NavigationUrl(url.to_string()))?;
            Ok(NavigationUrl { positive, regex: glob.as_regex_str().to_string() })
        };
        match urls {
            Some(urls) => urls.iter().map(|url| compile(url)).collect(),
            None => DEFAULT_NAVIGATION_URLS.iter().map(|url| compile(url)).collect(),
        }
    }

    /// Root-anchored URL paths of every file in the build output, sorted.
    async fn list_files(&self) -> Result<Vec<String>> {
        let listing_failed = || ErrorKind::Listing(self.backend.name().to_string());
        let listed = self.backend.list().await.or_raise(listing_failed)?;
        let bytes: u64 = listed.iter().map(|file| file.size).sum();
        let mut files =
            listed.iter().map(FileInfo::url_path).collect::<std::result::Result<Vec<_>, _>>().or_raise(listing_failed)?;
        files.sort_unstable();
        tracing::debug!(count = files.len(), bytes, "Listed build output");
        Ok(files)
    }

    async fn hash_files(&self, files: impl IntoIterator<Item = String>) -> Result<BTreeMap<String, String>> {
        let mut files: Vec<String> = files.into_iter().collect();
        files.sort_unstable();
        tracing::debug!(count = files.len(), batch_size = HASH_BATCH_SIZE, "Hashing files");
        let backend = self.backend.as_ref();
        let hashes = try_in_batches(files, HASH_BATCH_SIZE, |file| hash_file(backend, file)).await?;
        Ok(hashes.into_iter().map(|(file, hash)| (join_urls(&self.base_href, &file), hash)).collect())
    }
}

async fn hash_file(backend: &(dyn StorageBackend + Send + Sync), file: String) -> Result<(String, String)> {
    let hash = backend.hash(Path::new(&file)).await.or_raise(|| ErrorKind::Hashing(file.clone()))?;
    Ok((file, hash))
}

/// Group names key runtime caches, so they must be unique per kind.
fn check_unique_names(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();
    for group in &config.asset_groups {
        if !seen.insert(group.name.as_str()) {
            exn::bail!(ErrorKind::Config(format!("duplicate asset group name '{}'", group.name)));
        }
    }
    seen.clear();
    for group in &config.data_groups {
        if !seen.insert(group.name.as_str()) {
            exn::bail!(ErrorKind::Config(format!("duplicate data group name '{}'", group.name)));
        }
    }
    Ok(())
}

fn compile_asset_group(group: &AssetGroup) -> Result<CompiledAssetGroup<'_>> {
    if group.resources.versioned_files.is_some() {
        exn::bail!(ErrorKind::Config(format!(
            "asset group '{}' uses the 'versionedFiles' option, which is no longer supported; use 'files' instead",
            group.name
        )));
    }
    let files = GlobList::compile(&group.resources.files).or_raise(|| ErrorKind::AssetGroup(group.name.clone()))?;
    Ok(CompiledAssetGroup { group, files })
}

/// Partitions `files` between asset groups. A file belongs to the first
/// group, in declaration order, whose globs match it; files no group matches
/// are left out. Each group's list keeps the (sorted) input order.
fn assign_files(groups: &[CompiledAssetGroup<'_>], files: &[String]) -> Vec<Vec<String>> {
    let mut claimed: HashSet<&str> = HashSet::new();
    groups
        .iter()
        .map(|compiled| {
            let matched: Vec<&str> = files
                .iter()
                .map(String::as_str)
                .filter(|file| !claimed.contains(file) && compiled.files.is_match(file))
                .collect();
            claimed.extend(&matched);
            tracing::debug!(group = %compiled.group.name, files = matched.len(), "Assigned files");
            matched.into_iter().map(str::to_string).collect()
        })
        .collect()
}

fn now_millis() -> u64 {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or_default()
}
