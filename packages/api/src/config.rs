use std::net::SocketAddr;
use std::time::Duration;

use arena_core::config::{parse_var, ConfigError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub room_idle_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            room_idle_timeout: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();
        let room_idle_secs = parse_var(
            &lookup,
            "ARENA_ROOM_IDLE_TIMEOUT_SECS",
            defaults.room_idle_timeout.as_secs(),
        )?;
        let sweep_secs = parse_var(
            &lookup,
            "ARENA_SWEEP_INTERVAL_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "ARENA_SWEEP_INTERVAL_SECS".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(ServerConfig {
            bind_addr: parse_var(&lookup, "ARENA_BIND_ADDR", defaults.bind_addr)?,
            room_idle_timeout: Duration::from_secs(room_idle_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}
