//! Configuration file handling
//!
//! Everything lives in one JSON file. Every field has a default, so a missing
//! file or a partial one both load.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::endpoints::{default_endpoints, Endpoint};
use crate::error::ConfigError;
use crate::sync::RetryPolicy;

pub const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_MANIFEST_URL: &str =
    "http://47.122.133.57/downloads/vip-parser/v1.0.2/version-1.0.2.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub history: HistorySettings,

    #[serde(default)]
    pub update: UpdateSettings,

    /// Parse lines, in display order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<Endpoint>,
}

/// Health probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per probe
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Page every line is probed against
    #[serde(default = "default_test_url")]
    pub test_url: String,

    /// Probes in flight at once; derived from the CPU count when unset
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Background re-ranking period in seconds, 0 disables it
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_secs: u64,
}

fn default_timeout() -> u64 {
    5
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
}

fn default_test_url() -> String {
    "https://www.iqiyi.com".to_string()
}

fn default_monitor_interval() -> u64 {
    600
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get() * 2)
                .unwrap_or(4)
        })
        .clamp(1, 16)
    }

    pub fn monitor_interval(&self) -> Option<Duration> {
        (self.monitor_interval_secs > 0).then(|| Duration::from_secs(self.monitor_interval_secs))
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            test_url: default_test_url(),
            concurrency: None,
            monitor_interval_secs: default_monitor_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_limit")]
    pub limit: usize,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_cache_limit() -> usize {
    100
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    300
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            limit: default_cache_limit(),
            ttl_secs: default_cache_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    10
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSettings {
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,

    #[serde(default = "default_check_on_startup")]
    pub check_on_startup: bool,
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

fn default_check_on_startup() -> bool {
    true
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            check_on_startup: default_check_on_startup(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe: ProbeSettings::default(),
            cache: CacheSettings::default(),
            history: HistorySettings::default(),
            update: UpdateSettings::default(),
            endpoints: default_endpoints(),
        }
    }
}

impl Config {
    /// Loads `path`, or returns defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        let to_error = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
        std::fs::write(path, data).map_err(to_error)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::Invalid("probe.timeout_secs must be positive".into()));
        }
        if self.probe.max_retries == 0 {
            return Err(ConfigError::Invalid("probe.max_retries must be positive".into()));
        }
        if self.cache.limit == 0 {
            return Err(ConfigError::Invalid("cache.limit must be positive".into()));
        }
        for endpoint in &self.endpoints {
            validate_endpoint(endpoint)?;
        }
        Ok(())
    }
}

pub fn validate_endpoint(endpoint: &Endpoint) -> Result<(), ConfigError> {
    if endpoint.name.trim().is_empty() {
        return Err(ConfigError::Invalid("endpoint name must not be empty".into()));
    }
    if !(endpoint.base_url.starts_with("http://") || endpoint.base_url.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!(
            "endpoint {} must use an http(s) base URL, got {}",
            endpoint.name, endpoint.base_url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.probe.timeout(), Duration::from_secs(5));
        assert_eq!(config.probe.retry_policy(), RetryPolicy::new(2, Duration::from_millis(500)));
        assert_eq!(config.cache.limit, 100);
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.history.limit, 10);
        assert_eq!(config.endpoints.len(), 6);
        assert!(config.validate().is_ok());
        assert!((1..=16).contains(&config.probe.concurrency()));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "cache": { "limit": 2 }, "probe": { "monitor_interval_secs": 0, "concurrency": 64 } }"#,
        )
        .unwrap();

        assert_eq!(config.cache.limit, 2);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.probe.max_retries, 2);
        assert_eq!(config.probe.monitor_interval(), None);
        assert_eq!(config.probe.concurrency(), 16);
        assert_eq!(config.endpoints, default_endpoints());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join(CONFIG_FILE);

        let mut config = Config::default();
        config.endpoints = vec![Endpoint::new("mine", "https://mine.example/?url=")];
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        std::fs::write(&path, r#"{ "probe": { "timeout_secs": 0 } }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, r#"{ "endpoints": [{ "name": "x", "base_url": "ftp://x/" }] }"#)
            .unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
