//! Cache Store Module
//!
//! Unsynchronized entry table with TTL classification, counters and eviction
//! dispatch. `LocalCache` wraps it in a lock; every method here assumes the
//! caller already holds the appropriate side of that lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

/// Hook invoked with every entry just before it leaves the table.
pub type EvictionCallback<K, V> = Box<dyn Fn(&K, &CacheEntry<V>) + Send + Sync>;

// == Cache Store ==
/// Entry table plus the statistics and eviction callback that travel with it.
pub(crate) struct CacheStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Counters
    stats: StatsCounters,
    /// Registered at most once
    evicted: Option<EvictionCallback<K, V>>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: StatsCounters::new(),
            evicted: None,
        }
    }

    // == Eviction Callback ==
    /// Installs the eviction callback.
    ///
    /// # Panics
    /// If a callback is already registered.
    pub fn set_eviction_callback(&mut self, callback: EvictionCallback<K, V>) {
        if self.evicted.is_some() {
            panic!("eviction callback is already registered");
        }
        self.evicted = Some(callback);
    }

    // == Insert ==
    /// Inserts or overwrites `key`.
    ///
    /// Overwriting a live entry is not an eviction. Overwriting an entry that
    /// is already dead evicts it first so its callback still fires.
    pub fn insert(&mut self, key: K, value: V, ttl: Duration, now: Instant) {
        match self.entries.get(&key).map(|old| old.is_expired_at(now)) {
            Some(true) => {
                self.evict(&key);
                self.stats.record_insert();
            }
            Some(false) => {}
            None => self.stats.record_insert(),
        }

        self.entries.insert(key, CacheEntry::new(value, ttl, now));
        self.stats.record_write();
    }

    // == Try Insert ==
    /// Inserts `key` unless it currently holds a live entry.
    pub fn try_insert(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> Result<()> {
        if self.contains_live(&key, now) {
            return Err(CacheError::DuplicateKey);
        }
        self.insert(key, value, ttl, now);
        Ok(())
    }

    // == Lookup ==
    /// Answers a lookup that needs no mutation.
    ///
    /// Returns None when the entry is present but dead: evicting it requires
    /// exclusive access, so the caller must retry with [`CacheStore::lookup`].
    pub fn try_lookup<Q>(&self, key: &Q, now: Instant) -> Option<Result<&CacheEntry<V>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                Some(Err(CacheError::NoSuchKey))
            }
            Some(entry) if entry.is_expired_at(now) => None,
            Some(entry) => {
                self.stats.record_hit();
                Some(Ok(entry))
            }
        }
    }

    /// Classifies `key` at `now`, evicting it if it turns out to be dead.
    pub fn lookup<Q>(&mut self, key: &Q, now: Instant) -> Result<&CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return Err(CacheError::NoSuchKey);
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.evict(key);
            self.stats.record_miss();
            return Err(CacheError::KeyExpired);
        }

        self.stats.record_hit();
        self.entries.get(key).ok_or(CacheError::NoSuchKey)
    }

    /// True if `key` holds a live entry; touches no counters.
    pub fn contains_live<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Evict ==
    /// Removes `key` whether live or dead, notifying the callback first.
    ///
    /// Returns false if the key was not stored.
    pub fn evict<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(callback) = &self.evicted {
            match self.entries.get_key_value(key) {
                Some((stored_key, entry)) => callback(stored_key, entry),
                None => return false,
            }
        }

        if self.entries.remove(key).is_some() {
            self.stats.record_eviction();
            trace!("evicted cache entry");
            true
        } else {
            false
        }
    }

    // == Cleanup Expired ==
    /// Evicts every entry that is dead at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self, now: Instant) -> usize {
        if let Some(callback) = &self.evicted {
            self.entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .for_each(|(key, entry)| callback(key, entry));
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();

        self.stats.record_evictions(removed as u64);
        removed
    }

    // == Clear ==
    /// Evicts every stored entry, live or dead.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        if let Some(callback) = &self.evicted {
            for (key, entry) in &self.entries {
                callback(key, entry);
            }
        }

        let removed = self.entries.len();
        self.entries.clear();
        self.stats.record_flush();
        removed
    }

    /// Clears the table and zeroes every counter.
    pub fn reset(&mut self) -> usize {
        let removed = self.clear();
        self.stats.reset();
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    // == Length ==
    /// Number of stored entries, including dead ones not yet reaped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for CacheStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .field("has_eviction_callback", &self.evicted.is_some())
            .finish()
    }
}
