///! CLI configuration management
///!
///! Settings are layered: command-line flags and environment variables win
///! over the config file, which wins over built-in defaults.

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use reaper_common::{
    ElasticConfig, ReaperError, RetentionWindow, DEFAULT_INDEX_PREFIX, DEFAULT_RETENTION_DAYS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub index_prefix: Option<String>,
    pub retention_days: Option<i64>,
    pub timeout_secs: Option<u64>,
    pub insecure: bool,
    pub output: Option<String>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub days: Option<i64>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub prefix: Option<String>,
    pub timeout_secs: Option<u64>,
    pub insecure: Option<bool>,
    pub output: Option<String>,
    pub fail_on_error: bool,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub elastic: ElasticConfig,
    pub prefix: String,
    pub window: RetentionWindow,
    pub output: OutputFormat,
    pub fail_on_error: bool,
}

impl Config {
    /// Load the config file
    ///
    /// An explicitly given path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            if required {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        tracing::debug!(path = %config_path.display(), "loaded config file");
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".config/index-reaper/config.toml"))
    }

    /// Merge overrides into the file config and validate the result
    ///
    /// The retention floor is checked first so an unsafe window is rejected
    /// before anything else, including the cluster client, is set up.
    pub fn resolve(self, overrides: Overrides) -> Result<Settings> {
        let days = overrides
            .days
            .or(self.retention_days)
            .unwrap_or(DEFAULT_RETENTION_DAYS);
        let window = RetentionWindow::new(days)?;

        let host = overrides
            .host
            .or(self.host)
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                ReaperError::Config(
                    "cluster host is not set (use --host or ELASTIC_HOST)".to_string(),
                )
            })?;

        let mut elastic = ElasticConfig::new(&host);
        elastic.username = overrides.username.or(self.username);
        elastic.password = overrides.password.or(self.password);
        elastic.timeout = Duration::from_secs(
            overrides
                .timeout_secs
                .or(self.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        elastic.insecure = overrides.insecure.unwrap_or(self.insecure);

        let prefix = overrides
            .prefix
            .or(self.index_prefix)
            .unwrap_or_else(|| DEFAULT_INDEX_PREFIX.to_string());

        let output = overrides
            .output
            .or(self.output)
            .map(|o| OutputFormat::from_str(&o))
            .unwrap_or(OutputFormat::Table);

        Ok(Settings {
            elastic,
            prefix,
            window,
            output,
            fail_on_error: overrides.fail_on_error,
        })
    }
}
