//! Service worker manifest generation.
//!
//! Turns a declarative [`Config`](swgen_config::Config) into a deterministic,
//! versioned [`Manifest`]: build output files are partitioned into asset
//! groups, hashed in bounded batches, and every URL pattern is compiled into
//! an anchored regular expression the cache runtime can evaluate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use swgen_generator::Generator;
//! use swgen_storage::backend::LocalBackend;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(LocalBackend::new("dist", "/srv/app/dist")?);
//! let config = swgen_config::Config::load("/srv/app/ngsw-config.json")?;
//! let manifest = Generator::new(backend, "/").process(&config).await?;
//! println!("{}", manifest.to_json()?);
//! # Ok(())
//! # }
//! ```

mod duration;
pub mod error;
mod generator;
pub mod glob;
mod manifest;
mod url;

pub use crate::duration::parse_duration;
pub use crate::generator::{DEFAULT_NAVIGATION_URLS, Generator, HASH_BATCH_SIZE};
pub use crate::manifest::{
    AssetGroupManifest, CONFIG_VERSION, DataGroupManifest, Manifest, NavigationUrl, ResolvedCacheQueryOptions,
};
pub use crate::url::join_urls;
