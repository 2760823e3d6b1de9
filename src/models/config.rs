//! Server configuration loaded from environment variables
//!
//! Every value has a default so the server starts with no environment at
//! all; only `MONGODB_URL` switches on an optional backend.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

use super::errors::{AppError, AppResult};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MONGODB_DB: &str = "todolist";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_MAX_CONCURRENCY: usize = 512;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Enables the `/v2/todos` backend when present
    pub mongodb_url: Option<String>,
    pub mongodb_db: String,
    pub cache_ttl: Duration,
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            mongodb_url: None,
            mongodb_db: DEFAULT_MONGODB_DB.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    /// Unparsable numbers fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("TODO_HOST").unwrap_or(defaults.host),
            port: parse_or_default(non_empty("PORT"), "PORT", defaults.port),
            mongodb_url: non_empty("MONGODB_URL"),
            mongodb_db: non_empty("MONGODB_DB").unwrap_or(defaults.mongodb_db),
            cache_ttl: Duration::from_secs(parse_or_default(
                non_empty("TODO_CACHE_TTL_SECS"),
                "TODO_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            max_concurrent_requests: parse_or_default(
                non_empty("TODO_MAX_CONCURRENCY"),
                "TODO_MAX_CONCURRENCY",
                defaults.max_concurrent_requests,
            )
            .max(1),
        }
    }

    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            AppError::invalid_config(format!(
                "Invalid listen address {}:{}",
                self.host, self.port
            ))
        })
    }
}

fn parse_or_default<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}: {}. Using default value: {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.mongodb_url.is_none());
        assert_eq!(config.mongodb_db, "todolist");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("TODO_HOST", "127.0.0.1"),
            ("MONGODB_URL", "mongodb://db:27017"),
            ("MONGODB_DB", "todos_test"),
            ("TODO_CACHE_TTL_SECS", "5"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.mongodb_url.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(config.mongodb_db, "todos_test");
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("TODO_MAX_CONCURRENCY", "0")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_concurrent_requests, 1);
    }

    #[test]
    fn test_bad_host_is_config_error() {
        let config = config_from(&[("TODO_HOST", "not a host")]);
        assert!(config.socket_addr().is_err());
    }
}
