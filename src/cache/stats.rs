//! Cache Statistics Module
//!
//! Tracks entry counts, expirations, hits and misses.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored (live or not yet reaped)
    pub entries: u64,
    /// Entries removed by any eviction path since the last reset
    pub expired: u64,
    /// Successful lookups
    pub hits: u64,
    /// Failed lookups (key absent or expired)
    pub misses: u64,
    /// Successful insertions through `set` and `add`
    pub total: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

// == Stats Counters ==
/// Live counters owned by the store.
///
/// `hits` and `misses` are atomics because lookups that stay on the shared
/// lock still have to count. Everything else only changes under the
/// exclusive lock, and snapshots are taken under the exclusive lock too.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    entries: u64,
    expired: u64,
    total: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A net-new key was inserted.
    pub fn record_insert(&mut self) {
        self.entries += 1;
    }

    /// A successful `set`/`add`, whether or not it replaced an entry.
    pub fn record_write(&mut self) {
        self.total += 1;
    }

    /// One stored entry was evicted.
    pub fn record_eviction(&mut self) {
        self.record_evictions(1);
    }

    pub fn record_evictions(&mut self, count: u64) {
        self.entries = self.entries.saturating_sub(count);
        self.expired += count;
    }

    /// The whole table was dropped; every stored entry rolls into `expired`.
    pub fn record_flush(&mut self) {
        self.expired += self.entries;
        self.entries = 0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            entries: self.entries,
            expired: self.expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            total: self.total,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsCounters::new().snapshot();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = StatsCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot().hit_rate(), 0.75);
    }

    #[test]
    fn test_eviction_moves_entry_to_expired() {
        let mut counters = StatsCounters::new();
        counters.record_insert();
        counters.record_insert();
        counters.record_eviction();

        let stats = counters.snapshot();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.expired, 1);
    }

    #[test]
    fn test_flush_keeps_lookup_counters() {
        let mut counters = StatsCounters::new();
        counters.record_insert();
        counters.record_insert();
        counters.record_write();
        counters.record_hit();
        counters.record_miss();
        counters.record_flush();

        let stats = counters.snapshot();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.expired, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut counters = StatsCounters::new();
        counters.record_insert();
        counters.record_hit();
        counters.record_miss();
        counters.reset();
        assert_eq!(counters.snapshot(), CacheStats::default());
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            entries: 1,
            expired: 2,
            hits: 3,
            misses: 4,
            total: 5,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["entries"], 1);
        assert_eq!(json["total"], 5);
    }
}
