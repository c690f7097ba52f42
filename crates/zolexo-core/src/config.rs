//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the auth service base URL, the request timeout, where local storage
//! lives, and an optional device identifier override.
//!
//! Configuration is stored at `~/.config/zolexo/config.json`. The
//! `ZOLEXO_BASE_URL`, `ZOLEXO_STORAGE` and `ZOLEXO_DEVICE_ID` environment
//! variables take precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::device::{DeviceIdSource, FixedDeviceId, MachineIdSource};

/// Application name used for config/data directory paths
const APP_NAME: &str = "zolexo";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Local storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Auth service the app ships pointed at
pub const DEFAULT_BASE_URL: &str = "http://192.168.1.8:3000";

const ENV_BASE_URL: &str = "ZOLEXO_BASE_URL";
const ENV_STORAGE: &str = "ZOLEXO_STORAGE";
const ENV_DEVICE_ID: &str = "ZOLEXO_DEVICE_ID";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Could not find data directory")]
    NoDataDir,

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub storage_path: Option<PathBuf>,
    pub device_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage_path: None,
            device_id: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent) and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for local storage and logs
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn storage_path(&self) -> Result<PathBuf, ConfigError> {
        match self.storage_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join(STORAGE_FILE)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Device identifier source: the configured override, else the platform
    pub fn device_id_source(&self) -> Box<dyn DeviceIdSource> {
        match self.device_id {
            Some(ref id) if !id.is_empty() => Box::new(FixedDeviceId(id.clone())),
            _ => Box::new(MachineIdSource::default()),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(path) = lookup(ENV_STORAGE).filter(|v| !v.is_empty()) {
            self.storage_path = Some(PathBuf::from(path));
        }
        if let Some(id) = lookup(ENV_DEVICE_ID).filter(|v| !v.is_empty()) {
            self.device_id = Some(id);
        }
    }
}
