//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline used when `now + ttl` does not fit in an `Instant` (about 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

// == Cache Entry ==
/// Represents a single cache entry with its value and expiry deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant after which the entry must not be returned
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// A TTL too large to represent is clamped to a far-future deadline.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(now + FAR_FUTURE),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is still valid at exactly `expires_at`
    /// and expired strictly after it.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Checks if the entry has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
