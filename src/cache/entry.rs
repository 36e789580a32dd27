//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
///
/// Liveness is never stored: it is recomputed from `expires_at` against the
/// observation instant on every access.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion instant
    pub created_at: Instant,
    /// Absolute expiry instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry, resolving `ttl` against `now`.
    ///
    /// A zero TTL means the entry never expires.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            // Saturate absurd TTLs to "never" rather than overflowing Instant
            now.checked_add(ttl)
        };

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry is dead at the instant `now`.
    ///
    /// An entry is live iff `expires_at > now`, so it is expired as soon as
    /// `now` reaches the expiration instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks if the entry is dead right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the time left until expiry at `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }

    /// Returns the time left until expiry, measured now.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl_remaining_at(Instant::now())
    }
}
