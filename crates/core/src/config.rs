//! Client configuration
//!
//! Where the analysis service lives and how long to wait for it. Uploads get
//! minutes of idle time per read because the service runs pose inference
//! before replying, bounded by a larger overall cap; health and model queries
//! use a short control-plane timeout.

use std::{path::Path, time::Duration};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{GaitError, Result};

pub const API_URL_ENV_VAR: &str = "GAITGUARD_API_URL";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Longest idle read on `POST /analyze_gait` (upload + inference).
    pub request_timeout_secs: u64,
    /// Overall cap on one `POST /analyze_gait`, however steadily it progresses.
    pub upload_total_timeout_secs: u64,
    /// Applies to `GET /health` and `GET /models/info`.
    pub control_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 300,
            upload_total_timeout_secs: 1800,
            control_timeout_secs: 30,
            poll_interval_ms: 200,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `GAITGUARD_API_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        match std::env::var(API_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => self.base_url = url,
            _ => {}
        }
    }

    /// Load configuration from a JSON file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Parsed base URL, always ending in `/` so endpoints join beneath it.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| GaitError::Config {
            reason: format!("base_url {:?}: {}", self.base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GaitError::Config {
                reason: format!("base_url must be http or https, got {}", url.scheme()),
            });
        }
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_total_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_total_timeout_secs.max(self.request_timeout_secs))
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.upload_total_timeout(), Duration::from_secs(1800));
        assert_eq!(config.poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_upload_cap_never_below_read_timeout() {
        let config = ClientConfig {
            request_timeout_secs: 600,
            upload_total_timeout_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.upload_total_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig {
            base_url: "https://gait.example.org/api".to_string(),
            ..Default::default()
        };
        let url = config.base_url().unwrap();
        assert_eq!(
            url.join("analyze_gait").unwrap().as_str(),
            "https://gait.example.org/api/analyze_gait"
        );
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let config = ClientConfig {
            base_url: "ftp://gait.example.org/".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.base_url(), Err(GaitError::Config { .. })));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_save_then_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{"base_url": "http://10.0.2.2:8000/", "poll_interval_ms": 100}"#)
            .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://10.0.2.2:8000/");
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.request_timeout_secs, 300);

        let saved = dir.path().join("nested").join("saved.json");
        config.save(&saved).unwrap();
        assert_eq!(ClientConfig::load(&saved).unwrap(), config);
    }
}
