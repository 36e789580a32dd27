//! Local Cache - an in-process key-value cache
//!
//! Thread-safe table with per-entry TTL, lazy and active expiration, an
//! optional eviction callback and typed accessors for dynamically typed
//! values.
//!
//! ```
//! use std::time::Duration;
//! use local_cache::{CacheConfig, CacheError, LocalCache};
//!
//! let cache: LocalCache<String> = LocalCache::new(CacheConfig::default().without_sweep());
//! cache.set("answer", 42);
//! cache.set_with_ttl("session", "token", Duration::from_secs(30));
//!
//! assert_eq!(cache.get_i64("answer"), Ok(42));
//! assert_eq!(cache.get("missing"), Err(CacheError::NoSuchKey));
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheEntry, CacheStats, LocalCache, Lookup, Value};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_sweep_task, SweepHandle};
