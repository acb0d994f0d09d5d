//! Cache Table Module
//!
//! The façade over one backing table. Each call checks a connection out of
//! the pool, runs the operation, and returns the connection.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::cache::{
    operations, CacheRow, CacheTransaction, Statements, StoreOutcome, TableName, TableStats,
};
use crate::config::Config;
use crate::error::Result;

// == Cache Table ==
/// Memcache-style cache backed by a single relational table.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct CacheTable {
    /// Connection pool for the backing database
    pool: SqlitePool,
    /// Validated table identifier
    table: TableName,
    /// Statement text for `table`
    statements: Arc<Statements>,
    /// Database label used in `name()`
    database: String,
}

impl CacheTable {
    // == Constructors ==
    /// Wraps an existing pool. The table is not created; see [`ensure_schema`](Self::ensure_schema).
    pub fn new(pool: SqlitePool, table: TableName) -> Self {
        let statements = Arc::new(Statements::for_table(&table));
        Self {
            pool,
            table,
            statements,
            database: "sqlite".to_string(),
        }
    }

    /// Opens a pool from configuration and wraps it.
    ///
    /// In-memory databases get a single connection that never idles out,
    /// since every SQLite memory connection is a separate database. File
    /// databases use WAL journaling.
    pub async fn connect(config: &Config) -> Result<Self> {
        let table = TableName::new(config.table_name.clone())?;
        let in_memory = config.is_in_memory();

        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .busy_timeout(Duration::from_secs(config.busy_timeout))
            .create_if_missing(true);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .idle_timeout(Duration::from_secs(30))
                .max_lifetime(Duration::from_secs(1800))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let mut cache = Self::new(pool, table);
        cache.database = config.database_label();
        info!(name = %cache.name(), "cache table connected");
        Ok(cache)
    }

    // == Accessors ==
    /// Returns `"<database>:<table>"`, used to identify this cache in logs.
    pub fn name(&self) -> String {
        format!("{}:{}", self.database, self.table)
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// The underlying pool, for statements outside the cache operations.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // == Schema ==
    /// Creates the table with its unique key index and expiry index.
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        operations::ensure_schema(&mut conn, &self.statements).await?;
        info!(table = %self.table, "schema ready");
        Ok(())
    }

    /// Drops the table.
    pub async fn drop_schema(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        operations::drop_schema(&mut conn, &self.statements).await
    }

    // == Transactions ==
    /// Starts an explicit transaction; operations run through the handle
    /// commit or roll back together.
    pub async fn begin(&self) -> Result<CacheTransaction> {
        let tx = self.pool.begin().await?;
        Ok(CacheTransaction::new(tx, Arc::clone(&self.statements)))
    }

    // == Get ==
    /// Returns the live value at `key`, or None if absent or expired.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut found = self.get_multi(&[key]).await?;
        Ok(found.remove(key))
    }

    /// Returns the live values for `keys`; absent and expired keys are omitted.
    pub async fn get_multi<K: AsRef<str>>(&self, keys: &[K]) -> Result<HashMap<String, String>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.acquire().await?;
        operations::get_multi(&mut conn, &self.statements, keys).await
    }

    /// Returns the physical row at `key`, including an expired one.
    pub async fn row(&self, key: &str) -> Result<Option<CacheRow>> {
        let mut conn = self.pool.acquire().await?;
        operations::row(&mut conn, &self.statements, key).await
    }

    // == Set / Add / Replace ==
    /// Stores `value` at `key` unconditionally. `ttl` is in seconds; 0 never expires.
    pub async fn set(&self, key: &str, value: &str, ttl: u64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        operations::set(&mut conn, &self.statements, key, value, ttl).await
    }

    /// Stores `value` only if `key` holds no live row.
    pub async fn add(&self, key: &str, value: &str, ttl: u64) -> Result<StoreOutcome> {
        let mut conn = self.pool.acquire().await?;
        operations::add(&mut conn, &self.statements, key, value, ttl).await
    }

    /// Overwrites a live row at `key`, returning `value` whether or not a row matched.
    pub async fn replace(&self, key: &str, value: &str, ttl: u64) -> Result<String> {
        let mut conn = self.pool.acquire().await?;
        operations::replace(&mut conn, &self.statements, key, value, ttl).await
    }

    // == Counters ==
    /// Increments the counter at `key`. None if the key is missing or not numeric.
    pub async fn incr(&self, key: &str, amount: u64) -> Result<Option<u64>> {
        let mut conn = self.pool.acquire().await?;
        operations::adjust(&mut conn, &self.statements, key, i128::from(amount)).await
    }

    /// Decrements the counter at `key`, stopping at zero.
    pub async fn decr(&self, key: &str, amount: u64) -> Result<Option<u64>> {
        let mut conn = self.pool.acquire().await?;
        operations::adjust(&mut conn, &self.statements, key, -i128::from(amount)).await
    }

    // == Delete / Flush ==
    /// Deletes `key` now when `ttl` is 0, otherwise expires it `ttl` seconds from now.
    pub async fn delete(&self, key: &str, ttl: u64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        operations::delete(&mut conn, &self.statements, key, ttl).await
    }

    /// Removes every row immediately. `delay` is accepted but not honoured.
    pub async fn flush_all(&self, delay: Option<u64>) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        operations::flush_all(&mut conn, &self.statements, delay).await
    }

    // == Maintenance ==
    /// Physically removes expired rows, returning the count.
    pub async fn purge_expired(&self) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        operations::purge_expired(&mut conn, &self.statements).await
    }

    pub async fn stats(&self) -> Result<TableStats> {
        let mut conn = self.pool.acquire().await?;
        operations::stats(&mut conn, &self.statements).await
    }
}
