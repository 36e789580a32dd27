//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - TTL Sweep: Evicts expired cache entries at a configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
