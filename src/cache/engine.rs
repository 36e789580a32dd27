//! Cache Engine Module
//!
//! Thread-safe handle over a [`CacheStore`]: one table-wide reader/writer
//! lock, lazy expiration on every read, the optional background sweep and
//! the typed accessors for [`Value`] caches.

use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::cache::store::CacheStore;
use crate::cache::{CacheEntry, CacheStats, Value};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{spawn_sweep_task, SweepHandle};

// == Lookup ==
/// Non-failing lookup result.
///
/// A missing key and an expired key both come back as `valid == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<V> {
    pub valid: bool,
    pub value: Option<V>,
}

impl<V> Lookup<V> {
    fn hit(value: V) -> Self {
        Self {
            valid: true,
            value: Some(value),
        }
    }

    fn miss() -> Self {
        Self {
            valid: false,
            value: None,
        }
    }
}

impl<V> From<Result<V>> for Lookup<V> {
    fn from(result: Result<V>) -> Self {
        match result {
            Ok(value) => Self::hit(value),
            Err(_) => Self::miss(),
        }
    }
}

struct Shared<K, V> {
    store: RwLock<CacheStore<K, V>>,
    default_ttl: Duration,
    sweeper: Mutex<Option<SweepHandle>>,
}

// == Local Cache ==
/// In-process key-value cache with per-entry TTL.
///
/// Cloning is cheap and every clone shares the same table. All operations
/// funnel through a single table-wide lock; the eviction callback runs
/// inside that lock and must not call back into the cache.
pub struct LocalCache<K, V = Value> {
    shared: Arc<Shared<K, V>>,
}

/// Weak reference held by the sweep task.
pub(crate) struct WeakCache<K, V> {
    shared: Weak<Shared<K, V>>,
}

impl<K, V> WeakCache<K, V> {
    pub(crate) fn upgrade(&self) -> Option<LocalCache<K, V>> {
        self.shared.upgrade().map(|shared| LocalCache { shared })
    }
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache from `config`, starting the background sweep when a
    /// sweep interval is configured.
    pub fn new(config: CacheConfig) -> Self {
        let cache = Self::without_sweeper(config.default_ttl);

        if let Some(interval) = config.sweep_interval.filter(|i| !i.is_zero()) {
            let handle = spawn_sweep_task(&cache, interval);
            *cache.shared.sweeper.lock() = Some(handle);
        }

        debug!(
            "Cache created: default_ttl={:?}, sweep_interval={:?}",
            config.default_ttl, config.sweep_interval
        );
        cache
    }
}

impl<K, V> LocalCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates a cache with lazy expiration only.
    pub fn without_sweeper(default_ttl: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: RwLock::new(CacheStore::new()),
                default_ttl,
                sweeper: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakCache<K, V> {
        WeakCache {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// TTL applied by [`set`](Self::set) and [`add`](Self::add).
    pub fn default_ttl(&self) -> Duration {
        self.shared.default_ttl
    }

    // == Eviction Callback ==
    /// Registers the hook called with every evicted entry.
    ///
    /// The callback runs synchronously on whichever thread discovered the
    /// eviction, while the table lock is held and before the entry leaves the
    /// table. Hand the pair off to a queue if real work is needed.
    ///
    /// # Panics
    /// If a callback was already registered on this cache.
    pub fn register_eviction_callback<F>(&self, callback: F)
    where
        F: Fn(&K, &CacheEntry<V>) + Send + Sync + 'static,
    {
        self.shared
            .store
            .write()
            .set_eviction_callback(Box::new(callback));
    }

    // == Set ==
    /// Stores `value` under `key` with the default TTL, replacing any entry.
    pub fn set(&self, key: impl Into<K>, value: impl Into<V>) {
        self.set_with_ttl(key, value, self.shared.default_ttl);
    }

    /// Stores `value` under `key` with an explicit TTL.
    ///
    /// A zero TTL means the entry never expires.
    pub fn set_with_ttl(&self, key: impl Into<K>, value: impl Into<V>, ttl: Duration) {
        let (key, value) = (key.into(), value.into());
        let mut store = self.shared.store.write();
        store.insert(key, value, ttl, Instant::now());
    }

    // == Add ==
    /// Like [`set`](Self::set), but fails with `DuplicateKey` if `key` holds a
    /// live entry. A dead entry that has not been reaped yet does not block.
    pub fn add(&self, key: impl Into<K>, value: impl Into<V>) -> Result<()> {
        self.add_with_ttl(key, value, self.shared.default_ttl)
    }

    /// Like [`set_with_ttl`](Self::set_with_ttl), but fails with
    /// `DuplicateKey` if `key` holds a live entry.
    pub fn add_with_ttl(
        &self,
        key: impl Into<K>,
        value: impl Into<V>,
        ttl: Duration,
    ) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        let mut store = self.shared.store.write();
        store.try_insert(key, value, ttl, Instant::now())
    }

    // == Read Path ==
    /// Classifies `key` and projects the live entry through `read`.
    ///
    /// Hits and misses are answered under the shared lock. Finding a dead
    /// entry escalates to the exclusive lock, where the key is classified
    /// again from scratch so check and eviction happen in one critical
    /// section. The clock is read after each acquisition.
    fn read_entry<Q, T>(
        &self,
        key: &Q,
        read: impl FnOnce(&CacheEntry<V>, Instant) -> T,
    ) -> Result<T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        {
            let store = self.shared.store.read();
            let now = Instant::now();
            if let Some(result) = store.try_lookup(key, now) {
                return result.map(|entry| read(entry, now));
            }
        }

        let mut store = self.shared.store.write();
        let now = Instant::now();
        store.lookup(key, now).map(|entry| read(entry, now))
    }

    // == Get ==
    /// Returns a clone of the live value stored under `key`.
    ///
    /// # Errors
    /// - `NoSuchKey` if the key is not stored
    /// - `KeyExpired` if it was stored but is dead; the entry is evicted, so
    ///   the next call reports `NoSuchKey`
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.read_entry(key, |entry, _| entry.value.clone())
    }

    /// Like [`get`](Self::get), also returning the time left before expiry
    /// (None if the entry never expires).
    pub fn get_with_ttl<Q>(&self, key: &Q) -> Result<(V, Option<Duration>)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.read_entry(key, |entry, now| {
            (entry.value.clone(), entry.ttl_remaining_at(now))
        })
    }

    /// Non-failing [`get`](Self::get) with the same side effects.
    pub fn get_entry<Q>(&self, key: &Q) -> Lookup<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).into()
    }

    /// Looks up every key in `keys` under one exclusive lock acquisition.
    ///
    /// Keys are visited in the order given and each visit has the same side
    /// effects as [`get_entry`](Self::get_entry).
    pub fn get_many<I>(&self, keys: I) -> HashMap<K, Lookup<V>>
    where
        I: IntoIterator<Item = K>,
        V: Clone,
    {
        let mut store = self.shared.store.write();
        let now = Instant::now();

        keys.into_iter()
            .map(|key| {
                let result = store.lookup(&key, now).map(|entry| entry.value.clone());
                (key, Lookup::from(result))
            })
            .collect()
    }

    /// True if `key` holds a live entry. Touches no counters and evicts
    /// nothing.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.shared.store.read();
        store.contains_live(key, Instant::now())
    }

    // == Expire ==
    /// Evicts `key` immediately, live or not.
    ///
    /// Returns false if the key was not stored; that is not an error.
    pub fn expire<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.store.write().evict(key)
    }

    // == Flush ==
    /// Evicts every entry. Lookup and insertion counters are kept; the entry
    /// count rolls into the expired count.
    pub fn flush(&self) {
        let removed = self.shared.store.write().clear();
        debug!("Cache flushed: {} entries evicted", removed);
    }

    /// Evicts every entry and zeroes every counter.
    pub fn reset(&self) {
        let removed = self.shared.store.write().reset();
        debug!("Cache reset: {} entries evicted", removed);
    }

    // == Sweep ==
    /// Runs one active-expiration pass now, returning how many entries were
    /// evicted.
    pub fn sweep_expired(&self) -> usize {
        let mut store = self.shared.store.write();
        store.cleanup_expired(Instant::now())
    }

    /// Stops the background sweep task, if one is running. Idempotent.
    pub fn shutdown(&self) {
        if let Some(handle) = self.shared.sweeper.lock().take() {
            handle.shutdown();
            debug!("Cache sweep task shut down");
        }
    }

    /// True while a background sweep task owned by this cache is running.
    pub fn is_sweeping(&self) -> bool {
        self.shared
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Stats ==
    /// Consistent snapshot of every counter.
    pub fn stats(&self) -> CacheStats {
        // Exclusive so no shared-lock hit/miss can land mid-snapshot
        self.shared.store.write().stats()
    }

    // == Length ==
    /// Number of stored entries, including dead ones not yet reaped.
    pub fn len(&self) -> usize {
        self.shared.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.read().is_empty()
    }
}

// == Typed Accessors ==
impl<K> LocalCache<K, Value>
where
    K: Eq + Hash,
{
    fn get_as<Q, T>(&self, key: &Q, convert: impl FnOnce(&Value) -> Result<T>) -> Result<T>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Liveness first: a dead key never reports a type mismatch
        self.read_entry(key, |entry, _| convert(&entry.value))?
    }

    pub fn get_bool<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, Value::as_bool)
    }

    /// Accepts any signed integer width.
    pub fn get_i64<Q>(&self, key: &Q) -> Result<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, Value::as_i64)
    }

    /// Accepts any unsigned integer width.
    pub fn get_u64<Q>(&self, key: &Q) -> Result<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, Value::as_u64)
    }

    pub fn get_f64<Q>(&self, key: &Q) -> Result<f64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, Value::as_f64)
    }

    /// Accepts a string or a byte sequence.
    pub fn get_string<Q>(&self, key: &Q) -> Result<String>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, |value| value.as_str().map(Cow::into_owned))
    }

    /// Accepts a `u8`, or an `i8` reinterpreted as unsigned.
    pub fn get_byte<Q>(&self, key: &Q) -> Result<u8>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, Value::as_byte)
    }

    pub fn get_char<Q>(&self, key: &Q) -> Result<char>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_as(key, Value::as_char)
    }
}

impl<K, V> Clone for LocalCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> Default for LocalCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<K, V> fmt::Debug for LocalCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCache")
            .field("store", &*self.shared.store.read())
            .field("default_ttl", &self.shared.default_ttl)
            .finish()
    }
}
