//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::Serialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tally_core::RoundingRule;
use tally_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Interface to bind
    pub bind_addr: IpAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a request waits for a pooled connection
    pub db_acquire_timeout_secs: u64,

    /// How profit is rounded to whole currency units
    pub profit_rounding: RoundingRule,

    /// Page size when the client sends no `limit`
    pub default_page_size: i64,

    /// Largest `limit` a client may ask for
    pub max_page_size: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            database_path: PathBuf::from("./data/tally.db"),
            db_max_connections: 10,
            db_acquire_timeout_secs: 5,
            profit_rounding: RoundingRule::HalfUp,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_port: parse_var(&lookup, "HTTP_PORT", defaults.http_port)?,
            bind_addr: parse_var(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections: parse_var(
                &lookup,
                "DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            db_acquire_timeout_secs: parse_var(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout_secs,
            )?,
            profit_rounding: parse_var(&lookup, "PROFIT_ROUNDING", defaults.profit_rounding)?,
            default_page_size: parse_var(&lookup, "DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_var(&lookup, "MAX_PAGE_SIZE", defaults.max_page_size)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.max_page_size < 1 {
            return Err(ConfigError::InvalidValue("MAX_PAGE_SIZE".to_string()));
        }
        if !(1..=config.max_page_size).contains(&config.default_page_size) {
            return Err(ConfigError::PageSizeMismatch {
                default: config.default_page_size,
                max: config.max_page_size,
            });
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("DEFAULT_PAGE_SIZE ({default}) must be between 1 and MAX_PAGE_SIZE ({max})")]
    PageSizeMismatch { default: i64, max: i64 },
}
