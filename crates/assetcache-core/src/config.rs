//! Worker configuration.
//!
//! The values here are fixed when the worker is deployed: the cache version
//! identifier, the asset manifest, the notification defaults and the root
//! path. Built-in defaults match the shipped Llama Time app and can be
//! overridden by a JSON file stored at `~/.config/assetcache/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "assetcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Current cache version. Must change whenever the manifest changes, or
/// already-installed clients keep serving the old assets forever.
pub const CACHE_NAME: &str = "llama-time-cache-v5.3.1";

/// Core assets cached on install.
pub const URLS_TO_CACHE: &[&str] = &[
    "/",
    "/index.html",
    "https://fonts.googleapis.com/css2?family=Press+Start+2P&display=swap",
    "https://fonts.gstatic.com/s/pressstart2p/v15/e3t4euO8T-267oIAQAu6jDQyK3nVivM.woff2",
    "/icons/llama-icon-192.png",
    "/icons/llama-icon-512.png",
];

/// Origin the worker is registered for.
pub const DEFAULT_SCOPE: &str = "http://localhost:8080/";

/// Cached on install and opened on notification click.
pub const ROOT_PATH: &str = "/";

pub const NOTIFICATION_TITLE: &str = "Llama Time!";
pub const NOTIFICATION_BODY: &str = "New message received.";
pub const NOTIFICATION_ICON: &str = "icons/llama-icon-192.png";
pub const NOTIFICATION_BADGE: &str = "icons/llama-icon-192.png";

/// Transport timeout for the HTTP network.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: NOTIFICATION_BODY.to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    pub cache_name: String,
    pub urls_to_cache: Vec<String>,
    pub scope: String,
    pub root_path: String,
    pub notification: NotificationDefaults,
    /// Served on a network failure instead of no response, when set and cached.
    pub offline_fallback: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: CACHE_NAME.to_string(),
            urls_to_cache: URLS_TO_CACHE.iter().map(|s| s.to_string()).collect(),
            scope: DEFAULT_SCOPE.to_string(),
            root_path: ROOT_PATH.to_string(),
            notification: NotificationDefaults::default(),
            offline_fallback: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl WorkerConfig {
    /// Load the config from the default location, falling back to built-in
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root directory of the on-disk cache stores.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::InvalidScope {
            scope: self.scope.clone(),
            reason: e.to_string(),
        })
    }

    /// Resolve a manifest locator (relative path or absolute URL) against the scope.
    pub fn resolve(&self, locator: &str) -> Result<Url, ConfigError> {
        self.scope_url()?
            .join(locator)
            .map_err(|e| ConfigError::InvalidLocator {
                locator: locator.to_string(),
                reason: e.to_string(),
            })
    }

    /// The manifest as absolute URLs, in manifest order.
    pub fn manifest_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.urls_to_cache.iter().map(|l| self.resolve(l)).collect()
    }
}
