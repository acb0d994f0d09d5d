//! Table Cache - memcache semantics over a relational table
//!
//! Provides get/set/add/replace/incr/decr/delete/flush with TTL expiry,
//! backed by a SQLite table instead of in-memory buffers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheTable, CacheTransaction, StoreOutcome};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_purge_task;
