//! Cache Transaction Module
//!
//! An explicit transaction handle over one pooled connection. Operations run
//! through it share the transaction; each multi-statement operation nests as
//! a savepoint, so an `add` that finds a live key rolls back only itself.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{Sqlite, Transaction};

use crate::cache::{operations, CacheRow, Statements, StoreOutcome};
use crate::error::Result;

// == Cache Transaction ==
/// A transaction spanning several cache operations on the same table.
///
/// Dropping the handle without calling [`commit`](Self::commit) rolls back.
pub struct CacheTransaction {
    tx: Transaction<'static, Sqlite>,
    statements: Arc<Statements>,
}

impl CacheTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, statements: Arc<Statements>) -> Self {
        Self { tx, statements }
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let mut found = self.get_multi(&[key]).await?;
        Ok(found.remove(key))
    }

    pub async fn get_multi<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<HashMap<String, String>> {
        operations::get_multi(&mut self.tx, &self.statements, keys).await
    }

    pub async fn row(&mut self, key: &str) -> Result<Option<CacheRow>> {
        operations::row(&mut self.tx, &self.statements, key).await
    }

    pub async fn set(&mut self, key: &str, value: &str, ttl: u64) -> Result<()> {
        operations::set(&mut self.tx, &self.statements, key, value, ttl).await
    }

    pub async fn add(&mut self, key: &str, value: &str, ttl: u64) -> Result<StoreOutcome> {
        operations::add(&mut self.tx, &self.statements, key, value, ttl).await
    }

    pub async fn replace(&mut self, key: &str, value: &str, ttl: u64) -> Result<String> {
        operations::replace(&mut self.tx, &self.statements, key, value, ttl).await
    }

    pub async fn incr(&mut self, key: &str, amount: u64) -> Result<Option<u64>> {
        operations::adjust(&mut self.tx, &self.statements, key, i128::from(amount)).await
    }

    pub async fn decr(&mut self, key: &str, amount: u64) -> Result<Option<u64>> {
        operations::adjust(&mut self.tx, &self.statements, key, -i128::from(amount)).await
    }

    pub async fn delete(&mut self, key: &str, ttl: u64) -> Result<()> {
        operations::delete(&mut self.tx, &self.statements, key, ttl).await
    }

    /// Commits every operation run through this handle.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discards every operation run through this handle.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
