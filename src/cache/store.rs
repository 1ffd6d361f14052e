//! Cache Store Module
//!
//! Generic key/value store with per-entry TTL, lazy expiry on access and an
//! eager sweep driven by [`crate::tasks::spawn_sweep_task`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, DEFAULT_TTL};

// == TTL Cache ==
/// In-memory cache whose entries disappear once their TTL elapses.
///
/// There is no size cap and no LRU policy: memory is bounded only by the
/// sweep removing entries nobody reads again.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Effectiveness counters
    stats: CacheStats,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty cache using `default_ttl` for entries set without a TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
        }
    }

    /// Returns the TTL applied by `set(.., None)`.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Stores a value, replacing any existing entry and resetting its TTL.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a clone of the value if present and unexpired.
    ///
    /// An expired entry is removed and counted as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        if self.live_entry(key) {
            self.stats.record_hit();
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            self.stats.record_miss();
            None
        }
    }

    // == Has ==
    /// Same expiry check as [`TtlCache::get`] without cloning the value.
    pub fn has<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key)
    }

    /// Returns whether `key` maps to an unexpired entry, dropping it if expired.
    fn live_entry<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expired(1);
            self.stats.set_total_entries(self.entries.len());
        }
        !expired
    }

    // == Delete ==
    /// Removes an entry by key, returning whether one existed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Sweep Expired ==
    /// Removes all entries whose deadline has passed.
    ///
    /// Returns the number of entries removed. Entries still within their
    /// TTL are left untouched.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Swept expired cache entries");
        }
        self.stats.record_expired(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
