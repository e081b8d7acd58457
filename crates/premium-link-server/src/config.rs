//! Server configuration from command-line flags and environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Premium Link Server
#[derive(Debug, Clone, Parser)]
#[command(name = "premium-link-server")]
#[command(about = "Premium membership linking and status API", long_about = None)]
#[command(version)]
pub struct Config {
    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub database_max_connections: u32,

    /// Keep bindings in memory instead of PostgreSQL (development only)
    #[arg(long, env = "IN_MEMORY")]
    pub in_memory: bool,

    /// Base URL of the upstream profile ownership API
    #[arg(long, env = "ORACLE_URL")]
    pub oracle_url: Option<String>,

    /// Bearer token for the upstream profile ownership API
    #[arg(long, env = "ORACLE_API_KEY", hide_env_values = true)]
    pub oracle_api_key: Option<String>,

    /// JSON ownership table used instead of the upstream API (development only)
    #[arg(long, env = "ORACLE_FIXTURE", conflicts_with = "oracle_url")]
    pub oracle_fixture: Option<PathBuf>,

    /// Upper bound on a single ownership lookup, in milliseconds
    #[arg(long, env = "ORACLE_TIMEOUT_MS", default_value_t = 5000)]
    pub oracle_timeout_ms: u64,

    /// Bearer token enabling the admin API
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,
}

/// Where bindings are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSource {
    Postgres { url: String, max_connections: u32 },
    Memory,
}

/// Where ownership answers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleSource {
    Http { url: String, api_key: Option<String> },
    Fixture(PathBuf),
}

/// Configuration errors detected after parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is required unless --in-memory is set")]
    MissingDatabase,

    #[error("ORACLE_URL or ORACLE_FIXTURE is required")]
    MissingOracle,

    #[error("ORACLE_TIMEOUT_MS must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    pub fn storage(&self) -> Result<StorageSource, ConfigError> {
        if self.in_memory {
            return Ok(StorageSource::Memory);
        }
        match &self.database_url {
            Some(url) if !url.is_empty() => Ok(StorageSource::Postgres {
                url: url.clone(),
                max_connections: self.database_max_connections,
            }),
            _ => Err(ConfigError::MissingDatabase),
        }
    }

    pub fn oracle(&self) -> Result<OracleSource, ConfigError> {
        match (&self.oracle_url, &self.oracle_fixture) {
            (Some(url), _) if !url.is_empty() => Ok(OracleSource::Http {
                url: url.clone(),
                api_key: self.oracle_api_key.clone().filter(|k| !k.is_empty()),
            }),
            (_, Some(path)) => Ok(OracleSource::Fixture(path.clone())),
            _ => Err(ConfigError::MissingOracle),
        }
    }

    pub fn oracle_timeout(&self) -> Result<Duration, ConfigError> {
        if self.oracle_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Duration::from_millis(self.oracle_timeout_ms))
    }
}
