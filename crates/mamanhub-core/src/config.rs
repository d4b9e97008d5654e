//! Client configuration management.
//!
//! Configuration holds the API base URL, the refresh endpoint and login
//! route used by the token refresh flow, the HTTP timeout, and where
//! credentials are kept.
//!
//! Configuration is stored at `~/.config/mamanhub/config.json`. The
//! `MAMANHUB_API_BASE_URL` environment variable overrides the base URL.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "mamanhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const BASE_URL_ENV: &str = "MAMANHUB_API_BASE_URL";

const DEFAULT_API_BASE_URL: &str = "https://localhost:7220/api";
const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How concurrent 401 responses share token refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Concurrent refreshes wait on one lock; later requests reuse the
    /// token stored by the first one.
    #[default]
    Coalesce,
    /// Every rejected request runs its own refresh call.
    PerRequest,
}

/// Where the access/refresh token pair is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub refresh_path: String,
    pub login_route: String,
    pub timeout_secs: u64,
    pub refresh_policy: RefreshPolicy,
    pub token_storage: TokenStorage,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_policy: RefreshPolicy::default(),
            token_storage: TokenStorage::default(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults if missing) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
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

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
