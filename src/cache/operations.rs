//! Cache Operations Module
//!
//! Cache semantics expressed as statement sequences against a single
//! connection. Every multi-statement operation opens its own transaction on
//! the connection it is handed; when that connection is already inside a
//! transaction, sqlx nests it as a savepoint, so operations compose without
//! any shared "already in a transaction" flag.

use std::collections::HashMap;

use sqlx::{Connection, QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::{debug, info, warn};

use crate::cache::row::{current_timestamp_ms, expiry_from_ttl, horizon};
use crate::cache::{CacheRow, Statements, TableStats};
use crate::error::Result;

/// Keys bound per batch read. One slot of SQLite's 32766-variable limit
/// is left for `now`.
const MAX_KEYS_PER_STATEMENT: usize = 32_000;

// == Store Outcome ==
/// Result of an insert-only write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The row was written
    Stored,
    /// A live row already occupies the key
    NotStored,
}

impl StoreOutcome {
    /// Returns true if the write happened.
    pub fn is_stored(self) -> bool {
        matches!(self, StoreOutcome::Stored)
    }
}

// == Reads ==
/// Fetches the live values for `keys`. Absent and expired keys are omitted.
///
/// Key lists longer than one statement can bind are read in chunks inside a
/// single transaction, so every chunk sees the same snapshot.
pub async fn get_multi<K: AsRef<str>>(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    keys: &[K],
) -> Result<HashMap<String, String>> {
    let now = current_timestamp_ms();
    let mut results = HashMap::with_capacity(keys.len());
    let mut tx = conn.begin().await?;

    for chunk in keys.chunks(MAX_KEYS_PER_STATEMENT) {
        let mut query = QueryBuilder::<Sqlite>::new(stmts.select_in_prefix.as_str());
        query.push("(");
        {
            let mut separated = query.separated(", ");
            for key in chunk {
                separated.push_bind(key.as_ref());
            }
        }
        query.push(") AND (expires_at IS NULL OR expires_at > ");
        query.push_bind(now);
        query.push(")");

        let rows = query.build().fetch_all(&mut *tx).await?;
        for row in rows {
            results.insert(row.try_get("key")?, row.try_get("value")?);
        }
    }
    tx.commit().await?;

    debug!(requested = keys.len(), found = results.len(), "get");
    Ok(results)
}

/// Fetches the raw row for `key`, whether live or expired.
pub async fn row(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
) -> Result<Option<CacheRow>> {
    let row = sqlx::query_as::<_, CacheRow>(stmts.select_row.as_str())
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

// == Writes ==
/// Overwrites the row at `key`, live or expired, or inserts a new one.
pub async fn set(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
    value: &str,
    ttl: u64,
) -> Result<()> {
    let now = current_timestamp_ms();
    let expires_at = expiry_from_ttl(now, ttl);
    let mut tx = conn.begin().await?;

    // The update doubles as the existence check and takes the write lock
    let updated = sqlx::query(stmts.update.as_str())
        .bind(value)
        .bind(now)
        .bind(expires_at)
        .bind(key)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        sqlx::query(stmts.insert.as_str())
            .bind(key)
            .bind(value)
            .bind(now)
            .bind(expires_at)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    debug!(key, ttl, inserted = updated == 0, "set");
    Ok(())
}

/// Inserts `key` only if no live row holds it.
pub async fn add(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
    value: &str,
    ttl: u64,
) -> Result<StoreOutcome> {
    let now = current_timestamp_ms();
    let mut tx = conn.begin().await?;

    purge_key(&mut tx, stmts, key, now).await?;

    let inserted = sqlx::query(stmts.insert.as_str())
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(expiry_from_ttl(now, ttl))
        .execute(&mut *tx)
        .await;

    match inserted {
        Ok(_) => {
            tx.commit().await?;
            debug!(key, ttl, "add stored");
            Ok(StoreOutcome::Stored)
        }
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            tx.rollback().await?;
            debug!(key, "add not stored, key is live");
            Ok(StoreOutcome::NotStored)
        }
        Err(err) => Err(err.into()),
    }
}

/// Updates `key` if a row holds it, returning the written value.
///
/// The value is returned even when no live row matched.
pub async fn replace(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
    value: &str,
    ttl: u64,
) -> Result<String> {
    let now = current_timestamp_ms();
    let mut tx = conn.begin().await?;

    purge_key(&mut tx, stmts, key, now).await?;

    let updated = sqlx::query(stmts.update.as_str())
        .bind(value)
        .bind(now)
        .bind(expiry_from_ttl(now, ttl))
        .bind(key)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if updated == 0 {
        debug!(key, "replace matched no live row");
    } else {
        debug!(key, ttl, "replace");
    }
    Ok(value.to_string())
}

/// Adds `delta` to the counter at `key`, clamping the result to `0..=u64::MAX`.
///
/// Returns None when the key is not live or does not hold a decimal counter.
pub async fn adjust(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
    delta: i128,
) -> Result<Option<u64>> {
    let now = current_timestamp_ms();
    let mut tx = conn.begin().await?;

    // Serialize concurrent adjustments before reading
    sqlx::query(stmts.claim.as_str())
        .bind(key)
        .execute(&mut *tx)
        .await?;

    let current: Option<String> = sqlx::query_scalar(stmts.select_live_value.as_str())
        .bind(key)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(old) = current.as_deref().and_then(parse_counter) else {
        tx.rollback().await?;
        debug!(key, "counter miss");
        return Ok(None);
    };

    let new = apply_delta(old, delta);
    sqlx::query(stmts.update_value.as_str())
        .bind(new.to_string())
        .bind(now)
        .bind(key)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    debug!(key, old, new, "counter adjusted");
    Ok(Some(new))
}

/// Removes `key` now (`ttl == 0`) or schedules it to expire `ttl` seconds
/// from now without extending an earlier expiry.
pub async fn delete(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
    ttl: u64,
) -> Result<()> {
    if ttl == 0 {
        sqlx::query(stmts.delete.as_str())
            .bind(key)
            .execute(&mut *conn)
            .await?;
        debug!(key, "delete");
    } else {
        let expires_at = horizon(current_timestamp_ms(), ttl);
        sqlx::query(stmts.soft_delete.as_str())
            .bind(expires_at)
            .bind(key)
            .bind(expires_at)
            .execute(&mut *conn)
            .await?;
        debug!(key, ttl, "delete scheduled");
    }
    Ok(())
}

/// Removes every row. A deferred flush is not supported; `delay` is ignored.
pub async fn flush_all(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    delay: Option<u64>,
) -> Result<()> {
    if let Some(delay) = delay {
        warn!(delay, "deferred flush not supported, flushing now");
    }
    let removed = sqlx::query(stmts.flush.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    info!(removed, "flush_all");
    Ok(())
}

// == Maintenance ==
/// Physically deletes every expired row, returning how many were removed.
pub async fn purge_expired(conn: &mut SqliteConnection, stmts: &Statements) -> Result<u64> {
    let removed = sqlx::query(stmts.purge_expired.as_str())
        .bind(current_timestamp_ms())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    Ok(removed)
}

/// Counts live and expired rows.
pub async fn stats(conn: &mut SqliteConnection, stmts: &Statements) -> Result<TableStats> {
    let row = sqlx::query(stmts.stats.as_str())
        .bind(current_timestamp_ms())
        .fetch_one(&mut *conn)
        .await?;
    let total: i64 = row.try_get("total_rows")?;
    let expired: i64 = row.try_get("expired_entries")?;
    Ok(TableStats::new(
        u64::try_from(total).unwrap_or(0),
        u64::try_from(expired).unwrap_or(0),
    ))
}

/// Creates the table and its indexes if missing.
pub async fn ensure_schema(conn: &mut SqliteConnection, stmts: &Statements) -> Result<()> {
    let mut tx = conn.begin().await?;
    for statement in [
        &stmts.create_table,
        &stmts.create_key_index,
        &stmts.create_expiry_index,
    ] {
        sqlx::query(statement.as_str()).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Drops the table and its indexes.
pub async fn drop_schema(conn: &mut SqliteConnection, stmts: &Statements) -> Result<()> {
    sqlx::query(stmts.drop_table.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// == Helpers ==
/// Deletes the row at `key` only if it has expired.
async fn purge_key(
    conn: &mut SqliteConnection,
    stmts: &Statements,
    key: &str,
    now: i64,
) -> Result<()> {
    sqlx::query(stmts.delete_expired_key.as_str())
        .bind(key)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Parses a stored value as a counter: ASCII digits only, fitting in u64.
pub fn parse_counter(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Applies `delta` to `old`, clamping instead of wrapping.
pub fn apply_delta(old: u64, delta: i128) -> u64 {
    (i128::from(old) + delta).clamp(0, i128::from(u64::MAX)) as u64
}
