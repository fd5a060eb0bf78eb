//! Configuration management for the help desk server.
//!
//! Loads configuration from environment variables with sensible defaults.

use helpdesk_core::config::{
    AdmissionConfig, DEFAULT_CAPACITY_LIMIT, DEFAULT_MAX_PAGE_SIZE, SerialConflictPolicy,
};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: String,
    },

    /// A variable the selected storage needs is not set.
    #[error("Missing required variable {0}")]
    Missing(&'static str),
}

/// Where tickets and desks are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory, lost on restart.
    #[default]
    Memory,
    /// `PostgreSQL` via `DATABASE_URL`.
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("expected memory or postgres, got {other}")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Serve Prometheus metrics on `/metrics`
    pub metrics_enabled: bool,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Selected storage
    pub storage: StorageBackend,
    /// Present when `storage` is `Postgres`
    pub database: Option<DatabaseConfig>,
    /// Admission rules
    pub admission: AdmissionConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is malformed, or if
    /// `HELPDESK_STORAGE=postgres` is set without `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = parse_or(&lookup, "HELPDESK_STORAGE", StorageBackend::Memory)?;

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            }),
        };

        let capacity_limit = parse_or(&lookup, "HELPDESK_DESK_CAPACITY", DEFAULT_CAPACITY_LIMIT)?;
        if capacity_limit == 0 {
            return Err(invalid("HELPDESK_DESK_CAPACITY", "0", "must be at least 1"));
        }
        let max_page_size = parse_or(&lookup, "HELPDESK_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        if max_page_size == 0 {
            return Err(invalid("HELPDESK_MAX_PAGE_SIZE", "0", "must be at least 1"));
        }

        let admission = AdmissionConfig::new()
            .with_capacity_limit(capacity_limit)
            .with_max_page_size(max_page_size)
            .with_serial_conflict_policy(parse_or(
                &lookup,
                "HELPDESK_SERIAL_POLICY",
                SerialConflictPolicy::Literal,
            )?)
            .with_serialize_per_desk(parse_or(&lookup, "HELPDESK_SERIALIZE_PER_DESK", false)?);

        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 8080)?,
                metrics_enabled: parse_or(&lookup, "METRICS_ENABLED", true)?,
            },
            storage,
            database,
            admission,
        })
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| invalid(key, &raw, e)),
    }
}
