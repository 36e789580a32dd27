//! Error types for the cache engine
//!
//! Every variant is a deterministic outcome of the current table state, so
//! none of them is worth retrying without changing the input.

use thiserror::Error;

// == Cache Error Enum ==
/// Recoverable failures returned by cache operations.
///
/// Registering a second eviction callback is not represented here: that is a
/// contract violation and panics instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key was never stored, or was already removed before this call
    #[error("no such key")]
    NoSuchKey,

    /// Key was stored but its TTL had elapsed when it was observed
    #[error("key expired")]
    KeyExpired,

    /// Key holds a live value of a type the typed accessor does not accept
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// `add` was called for a key that already holds a live entry
    #[error("duplicate key")]
    DuplicateKey,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
