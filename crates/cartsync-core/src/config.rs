//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the shop API base URL, request timeout, last used username and an
//! optional log directory.
//!
//! Configuration is stored at `~/.config/cartsync/config.json`. The
//! `CARTSYNC_API_URL` environment variable overrides the stored base URL.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_API_BASE_URL, REQUEST_TIMEOUT_SECS};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "cartsync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "CARTSYNC_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub last_username: Option<String>,
    /// When set, logs are also written to daily files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            last_username: None,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"last_username": "ada@example.com"}"#)
            .expect("Failed to parse config JSON");

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(REQUEST_TIMEOUT_SECS));
        assert_eq!(config.last_username.as_deref(), Some("ada@example.com"));
        assert!(config.log_dir.is_none());
    }
}
