//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API endpoint, how saved passwords are trusted on restore, and where
//! saved passwords are kept.
//!
//! Configuration is stored at `~/.config/padelfriends/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileStore, KeyValueStore, KeyringStore};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "padelfriends";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "PADELFRIENDS_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Matches fetched per page unless configured otherwise
pub const DEFAULT_MATCHES_PAGE_SIZE: u32 = 10;

/// How a password found in the credential registry is treated when a group
/// is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestorePolicy {
    /// Mark the session authenticated as soon as a saved password exists.
    /// Works offline; a password changed server-side is only noticed when a
    /// data fetch is rejected.
    #[default]
    TrustCached,
    /// Confirm the saved password with the server before marking the session
    /// authenticated.
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub restore_policy: RestorePolicy,
    pub storage: StorageBackend,
    pub matches_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            restore_policy: RestorePolicy::default(),
            storage: StorageBackend::default(),
            matches_page_size: DEFAULT_MATCHES_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load from the config file (defaults when absent), then apply the
    /// environment override for the API URL.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::parse(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(contents).context("Failed to parse config file")?;
        if config.matches_page_size == 0 {
            config.matches_page_size = DEFAULT_MATCHES_PAGE_SIZE;
        }
        Ok(config)
    }

    fn apply_env_override(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for saved groups (file backend) and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build the configured backend for the credential registry
    pub fn credential_backend(&self) -> Result<Box<dyn KeyValueStore>> {
        Ok(match self.storage {
            StorageBackend::File => Box::new(FileStore::new(self.data_dir()?)),
            StorageBackend::Keyring => Box::new(KeyringStore::new(APP_NAME)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.restore_policy, RestorePolicy::TrustCached);
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.matches_page_size, 10);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(r#"{"restore_policy":"verify","storage":"keyring"}"#).unwrap();
        assert_eq!(config.restore_policy, RestorePolicy::Verify);
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.api_url, "http://localhost:8080");
    }

    #[test]
    fn test_zero_page_size_falls_back() {
        let config = Config::parse(r#"{"matches_page_size":0}"#).unwrap();
        assert_eq!(config.matches_page_size, 10);
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_env_override(Some("  https://padel.example.com ".to_string()));
        assert_eq!(config.api_url, "https://padel.example.com");

        config.apply_env_override(Some("   ".to_string()));
        assert_eq!(config.api_url, "https://padel.example.com");

        config.apply_env_override(None);
        assert_eq!(config.api_url, "https://padel.example.com");
    }
}
