//! Database configuration.

use std::time::Duration;

use thiserror::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const DATABASE_ACQUIRE_TIMEOUT_SECS: &str = "DATABASE_ACQUIRE_TIMEOUT_SECS";

/// Configuration loading error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Connection settings for [`PgExecutor::connect`](crate::PgExecutor::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Load from the process environment.
    ///
    /// `DATABASE_URL` is required; `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ACQUIRE_TIMEOUT_SECS` fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL))?;

        let mut config = Self::new(database_url);

        if let Some(raw) = lookup(DATABASE_MAX_CONNECTIONS) {
            config.max_connections = match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: DATABASE_MAX_CONNECTIONS,
                        expected: "a positive integer",
                        value: raw,
                    });
                }
            };
        }

        if let Some(raw) = lookup(DATABASE_ACQUIRE_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: DATABASE_ACQUIRE_TIMEOUT_SECS,
                expected: "a number of seconds",
                value: raw.clone(),
            })?;
            config.acquire_timeout = Duration::from_secs(secs);
        }

        Ok(config)
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
    fn defaults_apply_when_only_url_is_set() {
        let config = DbConfig::from_lookup(lookup(&[(DATABASE_URL, "postgres://localhost/jobly")])).unwrap();
        assert_eq!(config, DbConfig::new("postgres://localhost/jobly"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = DbConfig::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://db/jobly"),
            (DATABASE_MAX_CONNECTIONS, "12"),
            (DATABASE_ACQUIRE_TIMEOUT_SECS, " 30 "),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_or_blank_url_is_an_error() {
        assert_eq!(
            DbConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing(DATABASE_URL)
        );
        assert_eq!(
            DbConfig::from_lookup(lookup(&[(DATABASE_URL, "  ")])).unwrap_err(),
            ConfigError::Missing(DATABASE_URL)
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = DbConfig::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://db/jobly"),
            (DATABASE_MAX_CONNECTIONS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: DATABASE_MAX_CONNECTIONS, .. }));

        let err = DbConfig::from_lookup(lookup(&[
            (DATABASE_URL, "postgres://db/jobly"),
            (DATABASE_ACQUIRE_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"DATABASE_ACQUIRE_TIMEOUT_SECS must be a number of seconds, got "soon""#
        );
    }
}
