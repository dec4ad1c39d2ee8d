//! Process configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use featreq_auth::{DEFAULT_TOKEN_SIZE, SessionConfig};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults,
    /// except `DATABASE_URL`, which is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = parse_or(&lookup, "BIND_ADDR", || {
            DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })
        })?;

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", || Ok(DEFAULT_MAX_CONNECTIONS))?;

        let defaults = SessionConfig::default();
        let timeout_secs: i64 = parse_or(&lookup, "SESSION_TIMEOUT_SECS", || Ok(defaults.timeout.num_seconds()))?;
        if timeout_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TIMEOUT_SECS",
                value: timeout_secs.to_string(),
            });
        }

        let token_size: usize = parse_or(&lookup, "SESSION_TOKEN_BYTES", || Ok(DEFAULT_TOKEN_SIZE))?;
        if token_size == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_TOKEN_BYTES",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            session: SessionConfig {
                timeout: Duration::seconds(timeout_secs),
                token_size,
            },
        })
    }
}

fn parse_or<T, F, D>(lookup: &F, key: &'static str, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default(),
    }
}
