//! Configuration file support for ultraplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/ultraplan/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub plan: PlanConfig,

    #[serde(default)]
    pub runalyze: RunalyzeConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Plan source; the built-in plan is used when no path is set
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct PlanConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Runalyze API access
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunalyzeConfig {
    /// Personal API token; never logged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Replaces `base_url` when tried as the second endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_proxy: Option<String>,

    /// Prefixes the URL-encoded request URL is appended to
    #[serde(default)]
    pub proxies: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RunalyzeConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            local_proxy: None,
            proxies: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("ultraplan")
}

fn default_base_url() -> String {
    "https://runalyze.com/api/v1".into()
}

fn default_timeout_secs() -> u64 {
    20
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("ultraplan").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Check endpoint URLs and limits
    pub fn validate(&self) -> Result<()> {
        let runalyze = &self.runalyze;

        let endpoints = std::iter::once(&runalyze.base_url)
            .chain(runalyze.local_proxy.iter())
            .chain(runalyze.proxies.iter());
        for endpoint in endpoints {
            Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("Invalid URL '{}': {}", endpoint, e)))?;
        }

        if runalyze.timeout_secs == 0 {
            return Err(Error::Config("runalyze.timeout_secs must be positive".into()));
        }

        Ok(())
    }

    /// Token with surrounding whitespace removed, if one is configured
    pub fn runalyze_token(&self) -> Option<&str> {
        self.runalyze
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
