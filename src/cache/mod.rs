//! Cache Module
//!
//! Provides the in-memory entry table with TTL expiration, statistics and
//! eviction notification.

mod engine;
mod entry;
mod stats;
mod store;
mod value;


// Re-export public types
pub use engine::{Lookup, LocalCache};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::EvictionCallback;
pub use value::Value;

pub(crate) use engine::WeakCache;
