//! Embedded Store Maintenance Task
//!
//! Background task that periodically removes expired records from the
//! embedded store and flushes it to disk. Redis expires keys on its own, so
//! this only runs for the embedded backend.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::EmbeddedCache;
use crate::error::{CacheError, Result};

/// Runs one sweep-and-flush pass on a blocking thread.
///
/// Returns the number of expired records removed.
pub async fn run_maintenance(store: EmbeddedCache) -> Result<usize> {
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let removed = store.sweep_expired()?;
        store.flush()?;
        Ok(removed)
    })
    .await
    .map_err(|err| CacheError::Internal(format!("maintenance task failed: {}", err)))?
}

/// Spawns a background task that periodically sweeps the embedded store.
///
/// The task sleeps for `interval_secs` between passes. Failures are logged
/// and the task keeps running.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = EmbeddedCache::open("./tmp/cache")?;
/// let handle = spawn_maintenance_task(store, 86_400);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_maintenance_task(store: EmbeddedCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting embedded store maintenance with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match run_maintenance(store.clone()).await {
                Ok(0) => debug!("Maintenance: no expired records found"),
                Ok(removed) => info!("Maintenance: removed {} expired records", removed),
                Err(err) => error!("Maintenance pass failed: {}", err),
            }
        }
    })
}
