//! `swgen`: writes the service worker control manifest for a build output
//! directory.
//!
//! ```text
//! swgen dist ngsw-config.json /app/
//! ```

mod error;

use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use figment::providers::Serialized;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use swgen_config::{Config, Settings};
use swgen_generator::Generator;
use swgen_storage::BackendHandle;
use swgen_storage::backend::{LocalBackend, ReadOnlyBackend};
use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Generate a service worker control manifest.
///
/// Arguments left out fall back to the `SWGEN_*` environment, then to the
/// built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "swgen", version, about)]
struct Cli {
    /// Build output directory to list and hash.
    dist: Option<PathBuf>,

    /// Configuration document (`ngsw-config.json`).
    config: Option<PathBuf>,

    /// Base href the application is served from.
    base_href: Option<String>,

    /// Manifest file name, relative to the build output directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Generate the manifest without writing it.
    #[arg(long)]
    dry_run: bool,

    /// Print the manifest to standard output instead of writing it.
    #[arg(long)]
    stdout: bool,

    /// Enable debug output (`RUST_LOG` takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

/// Settings given on the command line. Anything left out is not serialized,
/// so lower layers still apply.
#[derive(Serialize, Debug, Default, PartialEq)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    dist: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            dist: cli.dist.clone(),
            config: cli.config.clone(),
            base_href: cli.base_href.clone(),
            output: cli.output.clone(),
            dry_run: cli.dry_run.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder().with_default_directive(default.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load(Serialized::defaults(Overrides::from(cli))).or_raise(|| ErrorKind::Settings)?;
    let config = Config::load(&settings.config).or_raise(|| ErrorKind::Config(settings.config.clone()))?;

    let dist = std::path::absolute(&settings.dist).or_raise(|| ErrorKind::Storage(settings.dist.clone()))?;
    let local = LocalBackend::new("dist", &dist).or_raise(|| ErrorKind::Storage(dist.clone()))?;
    let backend: BackendHandle = match settings.dry_run {
        true => Arc::new(ReadOnlyBackend::new(Arc::new(local))),
        false => Arc::new(local),
    };

    let manifest = Generator::new(backend.clone(), settings.base_href.as_str())
        .process(&config)
        .await
        .or_raise(|| ErrorKind::Generate)?;
    let json = manifest.to_json().or_raise(|| ErrorKind::Generate)?;

    if cli.stdout {
        println!("{json}");
        return Ok(());
    }
    backend.write(&settings.output, json.as_bytes()).await.or_raise(|| ErrorKind::Write(settings.output.clone()))?;
    tracing::info!(output = %dist.join(&settings.output).display(), files = manifest.hash_table.len(), "Wrote manifest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "index": "/index.html",
        "assetGroups": [{"name": "app", "resources": {"files": ["/index.html", "/*.js"]}}]
    }"#;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("dist");
        fs::create_dir_all(dist.join("assets")).unwrap();
        fs::write(dist.join("index.html"), "<html></html>").unwrap();
        fs::write(dist.join("main.js"), "console.log(1)").unwrap();
        fs::write(dist.join("assets/logo.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("ngsw-config.json"), CONFIG).unwrap();
        dir
    }

    fn cli(dir: &TempDir, extra: &[&str]) -> Cli {
        let dist = dir.path().join("dist");
        let config = dir.path().join("ngsw-config.json");
        let mut args = vec!["swgen", dist.to_str().unwrap(), config.to_str().unwrap()];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_positionals() {
        let cli = Cli::parse_from(["swgen", "build", "sw.json", "/app/", "--dry-run", "-o", "sw-manifest.json"]);
        assert_eq!(cli.dist, Some(PathBuf::from("build")));
        assert_eq!(cli.config, Some(PathBuf::from("sw.json")));
        assert_eq!(cli.base_href.as_deref(), Some("/app/"));
        assert_eq!(cli.output, Some(PathBuf::from("sw-manifest.json")));
        assert!(cli.dry_run);
        assert!(!cli.stdout);
    }

    #[rstest]
    #[case(&["swgen"], Overrides::default())]
    #[case(&["swgen", "--dry-run"], Overrides { dry_run: Some(true), ..Default::default() })]
    #[case(&["swgen", "out"], Overrides { dist: Some("out".into()), ..Default::default() })]
    fn test_only_given_arguments_override(#[case] args: &[&str], #[case] expected: Overrides) {
        assert_eq!(Overrides::from(&Cli::parse_from(args)), expected);
    }

    #[tokio::test]
    async fn test_run_writes_manifest_into_dist() {
        let dir = project();
        run(&cli(&dir, &["/app/"])).await.unwrap();

        let written = fs::read_to_string(dir.path().join("dist/ngsw.json")).unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(manifest["index"], "/app/index.html");
        assert_eq!(manifest["assetGroups"][0]["urls"], serde_json::json!(["/app/index.html", "/app/main.js"]));
        assert!(manifest["hashTable"].get("/app/assets/logo.svg").is_none());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = project();
        run(&cli(&dir, &["--dry-run"])).await.unwrap();
        assert!(!dir.path().join("dist/ngsw.json").exists());
    }

    #[tokio::test]
    async fn test_missing_dist_fails() {
        let dir = project();
        fs::remove_dir_all(dir.path().join("dist")).unwrap();
        let err = run(&cli(&dir, &[])).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage(_)));
    }

    #[tokio::test]
    async fn test_missing_config_fails() {
        let dir = project();
        fs::remove_file(dir.path().join("ngsw-config.json")).unwrap();
        let err = run(&cli(&dir, &[])).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config(_)));
    }
}
