//! Table Statistics Module
//!
//! Row counts for the backing table, split by liveness.

use serde::Serialize;

// == Table Stats ==
/// Snapshot of how many rows are live versus expired-but-present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Rows visible to cache operations
    pub live_entries: u64,
    /// Rows past their expiry that still occupy storage
    pub expired_entries: u64,
    /// All physical rows
    pub total_rows: u64,
}

impl TableStats {
    // == Constructor ==
    /// Builds stats from the physical row count and the expired row count.
    pub fn new(total_rows: u64, expired_entries: u64) -> Self {
        Self {
            live_entries: total_rows.saturating_sub(expired_entries),
            expired_entries,
            total_rows,
        }
    }

    // == Expired Ratio ==
    /// Fraction of physical rows that are expired, or 0.0 for an empty table.
    pub fn expired_ratio(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.expired_entries as f64 / self.total_rows as f64
        }
    }
}
