//! Active Expiration Task
//!
//! Background task that periodically evicts expired cache entries, so memory
//! held by entries nobody reads again is eventually reclaimed.

use std::hash::Hash;
use std::thread;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::{LocalCache, WeakCache};

/// Name of the OS thread driving the sweep loop.
const SWEEPER_THREAD_NAME: &str = "local-cache-sweeper";

// == Sweep Handle ==
/// Owner side of a running sweep task.
///
/// The task stops when [`SweepHandle::shutdown`] is called or when the
/// handle is dropped.
#[derive(Debug)]
pub struct SweepHandle {
    shutdown: watch::Sender<()>,
}

impl SweepHandle {
    /// Signals the task to stop after its current pass.
    pub fn shutdown(&self) {
        if self.shutdown.send(()).is_err() {
            debug!("Sweep task already stopped");
        }
    }

    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.shutdown.is_closed()
    }
}

/// Spawns a background task that sweeps `cache` every `interval`.
///
/// The task runs on a dedicated thread driving its own current-thread
/// runtime with the time driver enabled, so it works the same inside or
/// outside a caller's runtime. It only holds a weak reference to the cache,
/// so dropping every `LocalCache` handle also ends it.
///
/// A zero `interval` is rejected: nothing is spawned and the returned handle
/// reports itself finished.
///
/// # Example
/// ```ignore
/// let cache: LocalCache<String> = LocalCache::without_sweeper(Duration::from_secs(60));
/// let sweeper = spawn_sweep_task(&cache, Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.shutdown();
/// ```
pub fn spawn_sweep_task<K, V>(cache: &LocalCache<K, V>, interval: Duration) -> SweepHandle
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let (shutdown, signal) = watch::channel(());

    if interval.is_zero() {
        error!("Refusing to start TTL sweep task with a zero interval");
        return SweepHandle { shutdown };
    }

    let cache = cache.downgrade();
    let spawned = thread::Builder::new()
        .name(SWEEPER_THREAD_NAME.to_string())
        .spawn(move || match Builder::new_current_thread().enable_time().build() {
            Ok(runtime) => runtime.block_on(sweep_loop(cache, interval, signal)),
            Err(err) => error!("Failed to build sweeper runtime: {}", err),
        });
    if let Err(err) = spawned {
        error!("Failed to spawn sweeper thread: {}", err);
    }

    SweepHandle { shutdown }
}

async fn sweep_loop<K, V>(
    cache: WeakCache<K, V>,
    interval: Duration,
    mut signal: watch::Receiver<()>,
) where
    K: Eq + Hash,
{
    info!("Starting TTL sweep task with interval of {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            // Fires on an explicit shutdown, and errors once the handle is gone
            _ = signal.changed() => break,
        }

        let removed = match cache.upgrade() {
            Some(cache) => cache.sweep_expired(),
            None => break,
        };

        if removed > 0 {
            info!("TTL sweep: removed {} expired entries", removed);
        } else {
            debug!("TTL sweep: no expired entries found");
        }
    }

    debug!("TTL sweep task stopped");
}
