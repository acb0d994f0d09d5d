//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx SQLite URL of the backing database
    pub database_url: String,
    /// Name of the cache table
    pub table_name: String,
    /// Upper bound on pooled connections (file databases only)
    pub max_connections: u32,
    /// Seconds SQLite waits on a locked database before failing
    pub busy_timeout: u64,
    /// Create the table and indexes at startup if missing
    pub create_schema: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Seconds between expired-row purges; 0 disables the task
    pub purge_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` - SQLite URL (default: sqlite:table_cache.db)
    /// - `CACHE_TABLE` - Cache table name (default: cache_entries)
    /// - `MAX_CONNECTIONS` - Pool size (default: 5)
    /// - `BUSY_TIMEOUT` - Lock wait in seconds (default: 5)
    /// - `CREATE_SCHEMA` - Provision the table at startup (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            table_name: env::var("CACHE_TABLE").unwrap_or(defaults.table_name),
            max_connections: parse_var("MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            busy_timeout: parse_var("BUSY_TIMEOUT").unwrap_or(defaults.busy_timeout),
            create_schema: parse_var("CREATE_SCHEMA").unwrap_or(defaults.create_schema),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            purge_interval: parse_var("PURGE_INTERVAL").unwrap_or(defaults.purge_interval),
        }
    }

    /// Configuration for a private in-memory database, used by tests.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    /// Returns true if the URL names an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// The database part of the URL, without scheme or query string.
    pub fn database_label(&self) -> String {
        let path = self
            .database_url
            .strip_prefix("sqlite:")
            .unwrap_or(&self.database_url);
        let path = path.strip_prefix("//").unwrap_or(path);
        path.split('?').next().unwrap_or(path).to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:table_cache.db".to_string(),
            table_name: "cache_entries".to_string(),
            max_connections: 5,
            busy_timeout: 5,
            create_schema: true,
            server_port: 3000,
            purge_interval: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
