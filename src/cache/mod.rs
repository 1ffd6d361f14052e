//! Cache Module
//!
//! Provides a generic in-memory cache with TTL expiration and background sweep.

mod entry;
mod stats;
mod store;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// TTL used when neither the caller nor the configuration provides one
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Interval between background sweeps unless configured otherwise
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache handle shared between the sweep task and its callers
pub type SharedCache<K, V> = Arc<RwLock<TtlCache<K, V>>>;
