//! Cache Row Module
//!
//! Defines the persisted row layout and the clock helpers used for TTL math.

use chrono::Utc;
use sqlx::FromRow;

// == Cache Row ==
/// A single row of the backing table, live or expired.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CacheRow {
    /// The cache key (unique among all rows)
    pub key: String,
    /// The stored value, opaque text
    pub value: String,
    /// Last mutation timestamp (Unix milliseconds)
    pub updated_at: i64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<i64>,
}

impl CacheRow {
    // == Liveness ==
    /// Checks whether the row is visible to cache operations at `now_ms`.
    ///
    /// A row is live when it has no expiry or its expiry is strictly in the
    /// future. This mirrors the SQL predicate used by every statement.
    pub fn is_live_at(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(expires) => expires > now_ms,
            None => true,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the row has expired
    /// - `Some(remaining_ms)` if the row has a TTL and is still live
    /// - `None` if the row never expires
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> Option<u64> {
        self.expires_at
            .map(|expires| u64::try_from(expires - now_ms).unwrap_or(0))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Computes the expiry column value for a TTL in seconds.
///
/// A TTL of zero means "never expires" and maps to NULL.
pub fn expiry_from_ttl(now_ms: i64, ttl_secs: u64) -> Option<i64> {
    if ttl_secs == 0 {
        None
    } else {
        Some(horizon(now_ms, ttl_secs))
    }
}

/// Returns `now + ttl` in milliseconds, saturating instead of overflowing.
pub fn horizon(now_ms: i64, ttl_secs: u64) -> i64 {
    let ttl_ms = i64::try_from(ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    now_ms.saturating_add(ttl_ms)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn row(expires_at: Option<i64>) -> CacheRow {
        CacheRow {
            key: "k".to_string(),
            value: "v".to_string(),
            updated_at: 0,
            expires_at,
        }
    }

    #[test]
    fn test_row_without_expiry_is_live() {
        let row = row(None);
        assert!(row.is_live_at(i64::MAX));
        assert!(row.ttl_remaining_ms(0).is_none());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // Expiry equal to now is no longer live
        let row = row(Some(1_000));
        assert!(row.is_live_at(999));
        assert!(!row.is_live_at(1_000));
        assert!(!row.is_live_at(1_001));
    }

    #[test]
    fn test_ttl_remaining() {
        let row = row(Some(10_000));
        assert_eq!(row.ttl_remaining_ms(4_000), Some(6_000));
        assert_eq!(row.ttl_remaining_ms(12_000), Some(0));
    }

    #[test]
    fn test_expiry_from_ttl() {
        assert_eq!(expiry_from_ttl(5_000, 0), None);
        assert_eq!(expiry_from_ttl(5_000, 2), Some(7_000));
    }

    #[test]
    fn test_horizon_saturates() {
        assert_eq!(horizon(i64::MAX - 10, 1), i64::MAX);
        assert_eq!(horizon(0, u64::MAX), i64::MAX);
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(current_timestamp_ms() > 1_577_836_800_000);
    }
}
