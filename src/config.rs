//! Client Configuration
//!
//! Where the API lives, how often alerts are polled and where logs go.
//! Loaded from TOML with environment overrides; every field has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{SyncError, SyncResult};

pub const ENV_API_URL: &str = "DASHBOARD_API_URL";
pub const ENV_API_TOKEN: &str = "DASHBOARD_API_TOKEN";
pub const ENV_POLL_INTERVAL_MS: &str = "DASHBOARD_POLL_INTERVAL_MS";

/// Ten years
pub const MAX_RENEWAL_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000/api/v1`
    pub base_url: String,
    /// Bearer token for the authenticated entity families
    pub token: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Forward window for upcoming renewals
    pub renewal_window_days: i64,
    /// Rolling log directory (logging stays off when unset)
    pub log_dir: Option<PathBuf>,
    pub app_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            token: None,
            poll_interval_ms: 60_000,
            request_timeout_ms: 15_000,
            renewal_window_days: 90,
            log_dir: None,
            app_name: "Dashboard".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| SyncError::ValidationFailure(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, then apply environment overrides
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Unknown(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `DASHBOARD_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = raw.trim().parse().map_err(|_| {
                SyncError::ValidationFailure(format!(
                    "{} must be an integer, got `{}`",
                    ENV_POLL_INTERVAL_MS, raw
                ))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(SyncError::ValidationFailure("base_url cannot be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(SyncError::ValidationFailure("poll_interval_ms must be positive".into()));
        }
        if !(0..=MAX_RENEWAL_WINDOW_DAYS).contains(&self.renewal_window_days) {
            return Err(SyncError::ValidationFailure(format!(
                "renewal_window_days must be between 0 and {}",
                MAX_RENEWAL_WINDOW_DAYS
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Start the rolling file logger when `log_dir` is set
    pub fn init_logging(&self) -> SyncResult<()> {
        match &self.log_dir {
            Some(dir) => rolling_logger::init_logger(dir, &self.app_name)
                .map_err(|e| SyncError::Unknown(e.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_dashboard() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.renewal_window_days, 90);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://cs.example.com/api/v1"
            token = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://cs.example.com/api/v1");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.poll_interval_ms, 60_000);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ClientConfig::from_toml_str("poll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, SyncError::ValidationFailure(_)));
    }

    #[test]
    fn test_renewal_window_bounds() {
        for raw in ["renewal_window_days = -1", "renewal_window_days = 100000000"] {
            let err = ClientConfig::from_toml_str(raw).unwrap_err();
            assert!(matches!(err, SyncError::ValidationFailure(_)));
        }
        let config = ClientConfig::from_toml_str("renewal_window_days = 3650").unwrap();
        assert_eq!(config.renewal_window_days, MAX_RENEWAL_WINDOW_DAYS);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "http://10.0.0.2:8000/api/v1"),
            (ENV_API_TOKEN, ""),
            (ENV_POLL_INTERVAL_MS, "5000"),
        ]);
        let mut config = ClientConfig {
            token: Some("old".into()),
            ..ClientConfig::default()
        };

        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.2:8000/api/v1");
        assert!(config.token.is_none());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_bad_interval_override() {
        let mut config = ClientConfig::default();
        let result =
            config.apply_overrides(|key| (key == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, "renewal_window_days = 30\napp_name = \"Ops\"\n").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.renewal_window_days, 30);
        assert_eq!(config.app_name, "Ops");
    }
}
