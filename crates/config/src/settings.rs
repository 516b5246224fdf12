//! Tool settings.

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of the environment variables read by [`Settings::figment`].
pub const ENV_PREFIX: &str = "SWGEN_";

/// Where the generator reads from and writes to.
///
/// Resolved in increasing order of priority from [`Settings::default`], the
/// `SWGEN_*` environment (`SWGEN_DIST`, `SWGEN_CONFIG`, `SWGEN_BASE_HREF`,
/// `SWGEN_OUTPUT`, `SWGEN_DRY_RUN`) and whatever provider is passed to
/// [`Settings::load`], usually command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Build output directory that is listed and hashed.
    pub dist: PathBuf,
    /// Configuration document.
    pub config: PathBuf,
    /// Base href every manifest URL is joined with.
    pub base_href: String,
    /// Manifest file name, relative to [`dist`](Self::dist).
    pub output: PathBuf,
    /// Generate the manifest without writing it.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dist: PathBuf::from("dist"),
            config: PathBuf::from("ngsw-config.json"),
            base_href: "/".to_string(),
            output: PathBuf::from("ngsw.json"),
            dry_run: false,
        }
    }
}

impl Settings {
    /// Defaults layered with the `SWGEN_*` environment.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Resolves settings, with `overrides` taking priority over the
    /// environment and the defaults.
    pub fn load(overrides: impl figment::Provider) -> Result<Self> {
        let settings: Self =
            Self::figment().merge(overrides).extract().map_err(|e| ErrorKind::InvalidSettings(e.to_string()))?;
        tracing::debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}
