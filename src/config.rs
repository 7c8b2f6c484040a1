//! Configuration file for flock-feed
//!
//! Stored as TOML at the platform config directory:
//!   $XDG_CONFIG_HOME/flock-feed/config.toml on Linux
//!   ~/Library/Application Support/flock-feed/config.toml on macOS
//!   %APPDATA%/flock-feed/config/config.toml on Windows
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::calculator::{DEFAULT_WATER_RATIO, EngineOptions};
use crate::error::{FlockError, Result};
use crate::models::{FeedPolicy, FeedPrices};
use crate::remote::{HttpClient, RetryPolicy};

const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "flock_feed.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
}

/// Engine defaults applied before any command-line override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub policy: FeedPolicy,
    #[serde(default = "default_water_ratio")]
    pub water_ratio: f64,
    #[serde(default)]
    pub feed_prices: FeedPrices,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            policy: FeedPolicy::default(),
            water_ratio: default_water_ratio(),
            feed_prices: FeedPrices::default(),
        }
    }
}

fn default_water_ratio() -> f64 {
    DEFAULT_WATER_RATIO
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file for profiles; defaults to the platform data directory
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Keep profiles on the remote CRUD API instead of locally
    #[serde(default)]
    pub use_remote_profiles: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub crud_base_url: Option<String>,
    #[serde(default)]
    pub bedrock_base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            crud_base_url: None,
            bedrock_base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> usize {
    3
}

const fn default_base_backoff_ms() -> u64 {
    500
}

fn default_retry_statuses() -> Vec<u16> {
    RetryPolicy::default().retryable_statuses
}

impl RemoteSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_backoff_ms: self.base_backoff_ms,
            retryable_statuses: self.retry_statuses.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    fn client(&self, service: &'static str, key: &'static str, url: &Option<String>) -> Result<HttpClient> {
        let url = url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(FlockError::RemoteNotConfigured { service, key })?;
        HttpClient::new(service, url, self.token.clone(), self.timeout(), self.retry_policy())
    }

    pub fn bedrock_client(&self) -> Result<HttpClient> {
        self.client("bedrock", "bedrock_base_url", &self.bedrock_base_url)
    }

    pub fn crud_client(&self) -> Result<HttpClient> {
        self.client("crud", "crud_base_url", &self.crud_base_url)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "flock-feed")
}

impl AppConfig {
    /// Default config file location, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location. An explicit path must
    /// exist; a missing default file yields the default config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FlockError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| FlockError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this config, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            policy: self.engine.policy,
            water_ratio: self.engine.water_ratio,
            feed_prices: self.engine.feed_prices,
        }
    }

    /// Configured database path, else the platform data directory, else the working directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.database {
            return path.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
    }
}
