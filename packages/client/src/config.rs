use std::time::Duration;

use arena_core::config::{parse_var, ConfigError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            base_url: "http://127.0.0.1:8000".to_string(),
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl SyncConfig {
    pub fn new(base_url: &str) -> Self {
        SyncConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..SyncConfig::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SyncConfig::default();
        let base_url: String = parse_var(&lookup, "ARENA_SERVER_URL", defaults.base_url)?;
        let poll_ms = parse_var(
            &lookup,
            "ARENA_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?;
        if poll_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "ARENA_POLL_INTERVAL_MS".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let timeout_ms = parse_var(
            &lookup,
            "ARENA_REQUEST_TIMEOUT_MS",
            defaults.request_timeout.as_millis() as u64,
        )?;

        Ok(SyncConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(poll_ms),
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
