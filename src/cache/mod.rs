//! Cache Module
//!
//! Memcache semantics over a relational table: TTL expiry is a predicate on
//! `expires_at`, expired rows stay in place until overwritten or purged.

mod operations;
mod row;
mod stats;
mod statements;
mod table;
mod transaction;


// Re-export public types
pub use operations::StoreOutcome;
pub use row::{current_timestamp_ms, CacheRow};
pub use stats::TableStats;
pub use statements::{Statements, TableName, MAX_TABLE_NAME_LENGTH};
pub use table::CacheTable;
pub use transaction::CacheTransaction;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
