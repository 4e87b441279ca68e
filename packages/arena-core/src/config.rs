use std::str::FromStr;
use std::time::Duration;

use crate::models::board::{DEFAULT_BOARD_SIZE, DEFAULT_WIN_LENGTH};
use crate::models::negotiation::DEFAULT_EDIT_BUDGET;

pub const MIN_BOARD_SIZE: usize = 5;
pub const MAX_BOARD_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reads `key` through `lookup` and parses it, falling back to `default` when unset.
pub fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Rules shared by every room created by one registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub board_size: usize,
    pub win_length: usize,
    pub config_edit_budget: u8,
    pub chat_history_limit: usize,
    pub log_history_limit: usize,
    pub suggester_timeout: Duration,
    /// When set, no seat may propose until every occupied seat is Ready.
    pub require_all_ready: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            board_size: DEFAULT_BOARD_SIZE,
            win_length: DEFAULT_WIN_LENGTH,
            config_edit_budget: DEFAULT_EDIT_BUDGET,
            chat_history_limit: 50,
            log_history_limit: 200,
            suggester_timeout: Duration::from_secs(30),
            require_all_ready: false,
        }
    }
}

impl GameSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameSettings::default();
        let settings = GameSettings {
            board_size: parse_var(&lookup, "ARENA_BOARD_SIZE", defaults.board_size)?,
            win_length: parse_var(&lookup, "ARENA_WIN_LENGTH", defaults.win_length)?,
            config_edit_budget: parse_var(
                &lookup,
                "ARENA_CONFIG_EDIT_BUDGET",
                defaults.config_edit_budget,
            )?,
            chat_history_limit: parse_var(
                &lookup,
                "ARENA_CHAT_HISTORY_LIMIT",
                defaults.chat_history_limit,
            )?,
            log_history_limit: parse_var(
                &lookup,
                "ARENA_LOG_HISTORY_LIMIT",
                defaults.log_history_limit,
            )?,
            suggester_timeout: Duration::from_secs(parse_var(
                &lookup,
                "ARENA_SUGGESTER_TIMEOUT_SECS",
                defaults.suggester_timeout.as_secs(),
            )?),
            require_all_ready: parse_var(
                &lookup,
                "ARENA_REQUIRE_ALL_READY",
                defaults.require_all_ready,
            )?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(invalid(
                "ARENA_BOARD_SIZE",
                self.board_size,
                &format!("must be between {} and {}", MIN_BOARD_SIZE, MAX_BOARD_SIZE),
            ));
        }
        if self.win_length < 3 || self.win_length > self.board_size {
            return Err(invalid(
                "ARENA_WIN_LENGTH",
                self.win_length,
                "must be at least 3 and fit on the board",
            ));
        }
        if self.chat_history_limit == 0 {
            return Err(invalid("ARENA_CHAT_HISTORY_LIMIT", 0, "must be positive"));
        }
        if self.log_history_limit == 0 {
            return Err(invalid("ARENA_LOG_HISTORY_LIMIT", 0, "must be positive"));
        }
        if self.suggester_timeout.is_zero() {
            return Err(invalid("ARENA_SUGGESTER_TIMEOUT_SECS", 0, "must be positive"));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: impl std::fmt::Display, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = GameSettings::from_lookup(lookup(&[])).unwrap();

        assert_eq!(settings, GameSettings::default());
        assert_eq!(settings.board_size, 15);
        assert_eq!(settings.config_edit_budget, 2);
        assert!(!settings.require_all_ready);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let settings = GameSettings::from_lookup(lookup(&[
            ("ARENA_BOARD_SIZE", "19"),
            ("ARENA_SUGGESTER_TIMEOUT_SECS", "5"),
            ("ARENA_REQUIRE_ALL_READY", "true"),
        ]))
        .unwrap();

        assert_eq!(settings.board_size, 19);
        assert_eq!(settings.suggester_timeout, Duration::from_secs(5));
        assert!(settings.require_all_ready);
    }

    #[test]
    fn test_unparseable_value_is_reported() {
        let err = GameSettings::from_lookup(lookup(&[("ARENA_WIN_LENGTH", "five")])).unwrap_err();

        assert!(err.to_string().contains("ARENA_WIN_LENGTH"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(GameSettings::from_lookup(lookup(&[("ARENA_BOARD_SIZE", "3")])).is_err());
        assert!(GameSettings::from_lookup(lookup(&[
            ("ARENA_BOARD_SIZE", "9"),
            ("ARENA_WIN_LENGTH", "10")
        ]))
        .is_err());
        assert!(GameSettings::from_lookup(lookup(&[("ARENA_SUGGESTER_TIMEOUT_SECS", "0")])).is_err());
    }
}
