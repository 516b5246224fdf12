//! Configuration for swgen.
//!
//! Two kinds of configuration live here:
//!
//! - [`Config`], the declarative service worker configuration document
//!   (`ngsw-config.json`) describing asset groups, data groups and navigation
//!   URLs. It is the input of the manifest generator.
//! - [`Settings`], the tool settings (build output directory, base href,
//!   output file), layered from defaults, `SWGEN_*` environment variables and
//!   command-line overrides.
//!
//! Both are extracted through [`figment`].

mod document;
pub mod error;
mod settings;

pub use crate::document::{
    AssetGroup, AssetResources, CacheConfig, CacheQueryOptions, Config, DataGroup, InstallMode, Strategy,
};
pub use crate::settings::{ENV_PREFIX, Settings};
