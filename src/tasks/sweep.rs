//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries, so keys
//! that are set but never read again do not accumulate.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that sweeps expired entries once per `interval`.
///
/// The task runs until aborted. Each sweep holds the cache's write lock for
/// the duration of a single pass, so it never interleaves with `get`/`set`.
///
/// # Arguments
/// * `cache` - shared reference to the cache
/// * `interval` - time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, used to abort it at shutdown.
///
/// # Example
/// ```ignore
/// let cache: SharedCache<String, String> = Arc::new(RwLock::new(TtlCache::default()));
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V>(cache: SharedCache<K, V>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting cache sweep task");

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so the first sweep
        // happens one full interval after start.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.sweep_expired()
            };

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}
