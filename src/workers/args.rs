//! Command-line argument parsing and configuration.
//!
//! Supports:
//! - CLI arguments via clap
//! - TOML configuration file
//! - Merging CLI with file config (CLI takes precedence)

use crate::core::config::POLL_INTERVAL;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fetchdrop.toml";

/// Lower bound for `--poll-interval-ms`.
const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Fetchdrop - download an archive and watch it arrive.
#[derive(Parser, Deserialize, Clone, Debug, Default)]
#[command(author, version, about)]
#[command(propagate_version = true)]
#[serde(default)]
pub struct Args {
    /// TOML configuration file. Defaults to ./fetchdrop.toml when present.
    #[clap(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Directory finished downloads are written to.
    #[clap(long)]
    pub download_dir: Option<PathBuf>,

    /// Directory for logs. Defaults to ~/.fetchdrop/
    #[clap(long)]
    pub data_dir: Option<PathBuf>,

    /// Interval between two status queries, in milliseconds.
    #[clap(long)]
    pub poll_interval_ms: Option<u64>,

    /// Verbosity level (-v, -vv, -vvv).
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Load Args from CLI + TOML file (if it exists).
    /// CLI values override those from the file.
    pub fn load() -> Self {
        let mut cli_args = Args::parse();

        // Resolve relative paths to absolute before any working directory change
        cli_args.config = cli_args.config.map(Self::resolve_path);
        cli_args.download_dir = cli_args.download_dir.map(Self::resolve_path);
        cli_args.data_dir = cli_args.data_dir.map(Self::resolve_path);

        let config_path = cli_args.config_path();
        if let Some(file_args) = Self::from_file(&config_path) {
            return Self::merge(file_args, cli_args);
        }

        cli_args
    }

    /// The configuration file in use, whether or not it exists.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map(|ms| Duration::from_millis(ms.max(MIN_POLL_INTERVAL_MS)))
            .unwrap_or(POLL_INTERVAL)
    }

    /// Download directory: the configured one, else the platform download
    /// folder, else `<data_dir>/downloads`.
    pub fn download_dir(&self, data_dir: &Path) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| data_dir.join("downloads"))
    }

    /// Resolve a potentially relative path to an absolute one.
    fn resolve_path(p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            p
        } else {
            std::env::current_dir().unwrap_or_default().join(p)
        }
    }

    /// Load args from a TOML file.
    fn from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = fs::read_to_string(path).ok()?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Option<Self> {
        toml::from_str::<Args>(content).ok()
    }

    /// Merge file args with CLI args (CLI takes precedence).
    fn merge(mut file: Args, cli: Args) -> Args {
        if cli.download_dir.is_some() {
            file.download_dir = cli.download_dir;
        }
        if cli.data_dir.is_some() {
            file.data_dir = cli.data_dir;
        }
        if cli.poll_interval_ms.is_some() {
            file.poll_interval_ms = cli.poll_interval_ms;
        }
        if cli.verbose > 0 {
            file.verbose = cli.verbose;
        }
        file.config = cli.config;
        file
    }
}
