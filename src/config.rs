use std::path::{Path, PathBuf};

use anyhow::Context;
use directories_next::ProjectDirs;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub port: u16,
    /// Honor the `x-test-now-ms` header as the request time.
    #[serde(default)]
    pub test_mode: bool,
    pub database: Database,
    pub limits: Limits,
    #[serde(default)]
    pub maintenance: Maintenance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Maintenance {
    /// Run the dead-paste sweep every this many seconds while serving.
    pub purge_interval_secs: Option<u64>,
}

impl Config {
    /// Load config from `path`, or from the platform config directory if none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => default_path().context("could not determine config directory")?,
        };

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        toml::from_str(&source).context("failed to deserialize config")
    }
}

fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fadebin").map(|dirs| dirs.config_dir().join("config.toml"))
}
