//! Run configuration and fixed constants.

use std::num::NonZeroUsize;
use std::thread;

use crate::point_source::Seeding;
use crate::state::WorkerId;

/// Pi approximation the deviation history is measured against.
pub const REFERENCE_PI: f64 = std::f64::consts::PI;

/// Reporter-worker iterations between two deviation snapshots.
pub const ANALYSIS_INTERVAL: u64 = 1_000_000;

/// Worker count used when hardware concurrency cannot be determined.
pub const FALLBACK_WORKERS: usize = 2;

/// The worker that drives the snapshot recorder.
pub const REPORTER_WORKER: WorkerId = 0;

/// Number of hardware threads, if the platform can tell.
pub fn hardware_concurrency() -> Option<usize> {
    thread::available_parallelism().ok().map(NonZeroUsize::get)
}

/// Turns a detected worker count into the count actually spawned.
///
/// Undetectable and zero both resolve to [`FALLBACK_WORKERS`].
pub fn resolve_worker_count(detected: Option<usize>) -> usize {
    match detected {
        Some(n) if n > 0 => n,
        _ => FALLBACK_WORKERS,
    }
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub workers: usize,
    pub analysis_interval: u64,
    pub seeding: Seeding,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            workers: resolve_worker_count(hardware_concurrency()),
            analysis_interval: ANALYSIS_INTERVAL,
            seeding: Seeding::Entropy,
        }
    }
}

impl SamplerConfig {
    /// Overrides the worker count. Zero falls back to [`FALLBACK_WORKERS`].
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = resolve_worker_count(Some(workers));
        self
    }

    /// Overrides the snapshot interval. Zero disables snapshots.
    pub fn with_analysis_interval(mut self, interval: u64) -> Self {
        self.analysis_interval = interval;
        self
    }

    /// Seeds every stream deterministically from `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seeding = Seeding::Fixed(seed);
        self
    }
}
