//! Application configuration management.
//!
//! Settings come from an optional JSON file at
//! `~/.config/geomap/config.json`, overridden by `GEOMAP_*` environment
//! variables. The API base URL must be provided by one of the two.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::query::QueryOptions;

/// Application name used for the config directory path
const APP_NAME: &str = "geomap";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "GEOMAP_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "GEOMAP_REQUEST_TIMEOUT_SECS";
pub const ENV_LIST_STALE_SECS: &str = "GEOMAP_LIST_STALE_SECS";
pub const ENV_DETAIL_STALE_SECS: &str = "GEOMAP_DETAIL_STALE_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub list_stale_secs: Option<u64>,
    pub detail_stale_secs: Option<u64>,
}

impl Config {
    /// Load the config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
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

    /// Apply `GEOMAP_*` overrides looked up through `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url.trim().to_string());
        }
        let secs = |name: &str| -> Result<Option<u64>> {
            var(name)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a whole number of seconds", name))
                })
                .transpose()
        };
        if let Some(v) = secs(ENV_REQUEST_TIMEOUT_SECS)? {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = secs(ENV_LIST_STALE_SECS)? {
            self.list_stale_secs = Some(v);
        }
        if let Some(v) = secs(ENV_DETAIL_STALE_SECS)? {
            self.detail_stale_secs = Some(v);
        }
        Ok(())
    }

    pub fn api_url(&self) -> Result<&str> {
        self.api_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No API URL configured: set {} or add \"api_url\" to the config file",
                ENV_API_URL
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn query_options(&self) -> QueryOptions {
        let defaults = QueryOptions::default();
        QueryOptions {
            list_stale_time: self
                .list_stale_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.list_stale_time),
            detail_stale_time: self
                .detail_stale_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.detail_stale_time),
        }
    }

    /// Build the HTTP client described by this config.
    pub fn api_client(&self) -> Result<ApiClient> {
        let url = self.api_url()?;
        ApiClient::with_timeout(url, self.request_timeout())
            .context("Failed to build HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.api_url().is_err());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.query_options(), QueryOptions::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("http://localhost:8000".to_string()),
            list_stale_secs: Some(60),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config {
            api_url: Some("http://file:8000".to_string()),
            request_timeout_secs: Some(5),
            ..Default::default()
        };
        config
            .apply_overrides(vars(&[
                (ENV_API_URL, "http://env:9000"),
                (ENV_LIST_STALE_SECS, "10"),
                (ENV_DETAIL_STALE_SECS, " 2 "),
            ]))
            .unwrap();
        assert_eq!(config.api_url().unwrap(), "http://env:9000");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        let options = config.query_options();
        assert_eq!(options.list_stale_time, Duration::from_secs(10));
        assert_eq!(options.detail_stale_time, Duration::from_secs(2));
    }

    #[test]
    fn test_blank_env_url_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[(ENV_API_URL, "  ")])).unwrap();
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(vars(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn test_api_client_uses_configured_url() {
        let config = Config {
            api_url: Some("http://localhost:8000/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_client().unwrap().base_url(), "http://localhost:8000");
    }
}
