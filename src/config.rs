//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default TTL applied by `set`/`add` when no explicit TTL is given.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default interval between background sweep passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Cache engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for entries stored without an explicit TTL; zero means never expires
    pub default_ttl: Duration,
    /// Interval of the background sweep task, None = lazy expiration only
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds, 0 = never expires (default: 600)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds, 0 = disabled (default: 300)
    pub fn from_env() -> Self {
        let default_ttl = env::var("CACHE_DEFAULT_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL);

        let sweep_interval = match env::var("CACHE_SWEEP_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_SWEEP_INTERVAL),
        };

        Self {
            default_ttl,
            sweep_interval,
        }
    }

    /// Replaces the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enables the background sweep with the given interval.
    ///
    /// A zero interval disables the sweep, like `CACHE_SWEEP_INTERVAL=0`.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Disables the background sweep; expired entries are only reclaimed lazily.
    pub fn without_sweep(mut self) -> Self {
        self.sweep_interval = None;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::default()
            .with_default_ttl(Duration::from_secs(5))
            .with_sweep_interval(Duration::from_millis(250));
        assert_eq!(config.default_ttl, Duration::from_secs(5));
        assert_eq!(config.sweep_interval, Some(Duration::from_millis(250)));

        assert_eq!(config.clone().without_sweep().sweep_interval, None);
        assert_eq!(config.with_sweep_interval(Duration::ZERO).sweep_interval, None);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the env vars to avoid races between test threads
        env::remove_var("CACHE_DEFAULT_TTL");
        env::remove_var("CACHE_SWEEP_INTERVAL");
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("CACHE_DEFAULT_TTL", "42");
        env::set_var("CACHE_SWEEP_INTERVAL", "0");
        let config = CacheConfig::from_env();
        assert_eq!(config.default_ttl, Duration::from_secs(42));
        assert_eq!(config.sweep_interval, None);

        env::set_var("CACHE_DEFAULT_TTL", "not-a-number");
        env::set_var("CACHE_SWEEP_INTERVAL", "7");
        let config = CacheConfig::from_env();
        assert_eq!(config.default_ttl, DEFAULT_TTL);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(7)));

        env::remove_var("CACHE_DEFAULT_TTL");
        env::remove_var("CACHE_SWEEP_INTERVAL");
    }
}
