//! Expiry Purge Task
//!
//! Background task that periodically deletes expired-but-present rows so
//! they stop occupying storage. Reads never depend on it: expired rows are
//! already invisible to every cache operation.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheTable;

/// Spawns a background task that periodically purges expired rows.
///
/// Store failures are logged and the loop keeps running; the next tick
/// retries.
///
/// # Arguments
/// * `cache` - The table to purge
/// * `interval_secs` - Interval in seconds between purge runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_purge_task(cache: CacheTable, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            table = %cache.table(),
            "Starting expiry purge task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.purge_expired().await {
                Ok(0) => debug!("Expiry purge: no expired rows found"),
                Ok(removed) => info!("Expiry purge: removed {} expired rows", removed),
                Err(err) => warn!(error = %err, "Expiry purge failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn memory_table() -> CacheTable {
        let cache = CacheTable::connect(&Config::in_memory()).await.unwrap();
        cache.ensure_schema().await.unwrap();
        cache
    }

    #[tokio::test]
    async fn test_purge_task_removes_expired_rows() {
        let cache = memory_table().await;
        cache.set("expire_soon", "value", 1).await.unwrap();

        let handle = spawn_purge_task(cache.clone(), 1);

        // Wait for the row to expire and a purge to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(
            cache.row("expire_soon").await.unwrap().is_none(),
            "Expired row should have been purged"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_preserves_live_rows() {
        let cache = memory_table().await;
        cache.set("long_lived", "value", 3600).await.unwrap();
        cache.set("forever", "value", 0).await.unwrap();

        let handle = spawn_purge_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.get("long_lived").await.unwrap().as_deref(), Some("value"));
        assert_eq!(cache.get("forever").await.unwrap().as_deref(), Some("value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_can_be_aborted() {
        let cache = memory_table().await;

        let handle = spawn_purge_task(cache, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
