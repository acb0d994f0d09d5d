//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;

use crate::cache::TableStats;

/// Response body for a single-key get (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for a batch get (POST /get). Missing keys are omitted.
#[derive(Debug, Clone, Serialize)]
pub struct GetMultiResponse {
    pub values: HashMap<String, String>,
}

/// Response body for set, add and replace
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// The key that was written
    pub key: String,
    /// Whether the value was stored
    pub stored: bool,
    /// The value written by a replace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl StoreResponse {
    /// Creates a StoreResponse for a successful write
    pub fn stored(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            stored: true,
            value: None,
        }
    }

    /// Creates a StoreResponse echoing the value a replace wrote
    pub fn replaced(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::stored(key)
        }
    }
}

/// Response body for incr and decr
#[derive(Debug, Clone, Serialize)]
pub struct CounterResponse {
    pub key: String,
    /// Counter value after the adjustment
    pub value: u64,
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        let key = key.into();
        let message = if ttl == 0 {
            format!("Key '{}' deleted", key)
        } else {
            format!("Key '{}' expires in {} seconds", key, ttl)
        };
        Self { message, key }
    }
}

/// Response body for POST /flush_all
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub message: String,
}

impl FlushResponse {
    pub fn new() -> Self {
        Self {
            message: "All keys flushed".to_string(),
        }
    }
}

impl Default for FlushResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Rows visible to cache operations
    pub live_entries: u64,
    /// Expired rows still occupying storage
    pub expired_entries: u64,
    /// All physical rows
    pub total_rows: u64,
    /// expired_entries / total_rows
    pub expired_ratio: f64,
}

impl From<TableStats> for StatsResponse {
    fn from(stats: TableStats) -> Self {
        Self {
            live_entries: stats.live_entries,
            expired_entries: stats.expired_entries,
            total_rows: stats.total_rows,
            expired_ratio: stats.expired_ratio(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
