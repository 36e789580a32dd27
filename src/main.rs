//! Local Cache soak driver
//!
//! Hammers a `LocalCache` from several concurrent workers, then prints the
//! final statistics as JSON. Useful for eyeballing lock contention and sweep
//! behaviour under load.

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_cache::{CacheConfig, CacheError, LocalCache};

/// Soak parameters, read from the environment.
#[derive(Debug, Clone)]
struct SoakConfig {
    /// Concurrent worker tasks
    workers: usize,
    /// Distinct keys the workers contend on
    keys: u64,
    /// How long to run before stopping on its own
    duration: Duration,
}

impl SoakConfig {
    /// # Environment Variables
    /// - `SOAK_WORKERS` - Worker tasks (default: 8)
    /// - `SOAK_KEYS` - Key space size (default: 1024)
    /// - `SOAK_SECONDS` - Run time in seconds (default: 10)
    fn from_env() -> Self {
        Self {
            workers: parse_env("SOAK_WORKERS").unwrap_or(8),
            keys: parse_env("SOAK_KEYS").unwrap_or(1024).max(1),
            duration: Duration::from_secs(parse_env("SOAK_SECONDS").unwrap_or(10)),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "local_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    let soak = SoakConfig::from_env();
    info!(
        "Configuration loaded: default_ttl={:?}, sweep_interval={:?}, workers={}, keys={}, duration={:?}",
        config.default_ttl, config.sweep_interval, soak.workers, soak.keys, soak.duration
    );

    let cache: LocalCache<String> = LocalCache::new(config);

    let evicted = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&evicted);
    cache.register_eviction_callback(move |_, _| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let mut workers = JoinSet::new();
    for worker in 0..soak.workers {
        workers.spawn(run_worker(cache.clone(), worker as u64, soak.keys));
    }
    info!("Started {} workers", soak.workers);

    tokio::select! {
        _ = tokio::time::sleep(soak.duration) => {
            info!("Soak duration elapsed, stopping...");
        }
        result = signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, stopping...");
        }
    }

    workers.abort_all();
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            if !err.is_cancelled() {
                warn!("Worker failed: {}", err);
            }
        }
    }

    cache.shutdown();

    let stats = cache.stats();
    info!(
        "Soak complete: hit_rate={:.3}, callbacks={}",
        stats.hit_rate(),
        evicted.load(Ordering::Relaxed)
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("failed to serialize stats")?
    );

    Ok(())
}

/// Mixed workload over a shared key space; runs until aborted.
async fn run_worker(cache: LocalCache<String>, worker: u64, keys: u64) {
    let mut step: u64 = worker;

    loop {
        // Cheap LCG so workers walk the key space in different orders
        step = step
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let key = format!("key-{}", (step >> 33) % keys);

        match (step >> 40) % 10 {
            0..=2 => cache.set_with_ttl(key, step, Duration::from_millis(step % 500)),
            3 => {
                if let Err(CacheError::DuplicateKey) = cache.add(key, step) {
                    debug!("worker {} lost an add race", worker);
                }
            }
            4 => {
                cache.expire(&key);
            }
            _ => {
                let _ = cache.get_u64(&key);
            }
        }

        // Yield so the sweeper and other workers get scheduled
        tokio::task::yield_now().await;
    }
}
