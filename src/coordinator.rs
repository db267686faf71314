//! Owns the worker pool for one run: spawn, wait, stop, join, aggregate.

use std::io::Write;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{resolve_worker_count, SamplerConfig, REFERENCE_PI, REPORTER_WORKER};
use crate::error::{PiError, Result};
use crate::report::Reporter;
use crate::snapshot::{DeviationHistory, SnapshotRecorder};
use crate::state::{SharedState, Tally, WorkerId};
use crate::trigger::InterruptTrigger;
use crate::worker::{Worker, WorkerOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Draining,
    Done,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workers: usize,
    /// Per-worker counts in `WorkerId` order.
    pub outcomes: Vec<WorkerOutcome>,
    pub tally: Tally,
    pub history: DeviationHistory,
    /// From the last spawn until sampling ended.
    pub sampling_time: Duration,
    /// From raising the stop signal until the last join.
    pub drain_time: Duration,
}

impl RunSummary {
    /// `4 * hits / total`, or [`PiError::NoData`] if nothing was sampled.
    pub fn estimate(&self) -> Result<f64> {
        self.tally.estimate().ok_or(PiError::NoData)
    }

    pub fn samples_per_second(&self) -> Option<f64> {
        let secs = self.sampling_time.as_secs_f64();
        (secs > 0.0).then(|| self.tally.total as f64 / secs)
    }
}

/// Hooks the coordinator calls while moving through its phases.
trait Lifecycle {
    fn launching(&mut self, _workers: usize) -> Result<()> {
        Ok(())
    }

    /// Blocks while the workers sample.
    fn running(&mut self) -> Result<()> {
        Ok(())
    }

    fn interrupting(&mut self, _worker: WorkerId) -> Result<()> {
        Ok(())
    }
}

struct Interactive<'a, T, W: Write> {
    trigger: &'a mut T,
    reporter: &'a mut Reporter<W>,
}

impl<T: InterruptTrigger, W: Write> Lifecycle for Interactive<'_, T, W> {
    fn launching(&mut self, workers: usize) -> Result<()> {
        Ok(self.reporter.launching(workers)?)
    }

    fn running(&mut self) -> Result<()> {
        self.reporter.prompt()?;
        self.trigger.wait();
        Ok(())
    }

    fn interrupting(&mut self, worker: WorkerId) -> Result<()> {
        Ok(self.reporter.interrupting(worker)?)
    }
}

/// Fixed-budget runs end on their quotas and report nothing along the way.
struct Silent;

impl Lifecycle for Silent {}

pub struct Coordinator {
    config: SamplerConfig,
    phase: Phase,
}

impl Coordinator {
    /// A worker count of zero is corrected to the fallback count.
    pub fn new(mut config: SamplerConfig) -> Self {
        config.workers = resolve_worker_count(Some(config.workers));
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    /// Current phase. A run that fails also ends in [`Phase::Done`].
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Samples until `trigger` returns, narrating through `reporter`.
    ///
    /// The summary is returned, not rendered; pass it to
    /// [`Reporter::summary`] to print the estimate and deviation history.
    pub fn run<T, W>(&mut self, trigger: &mut T, reporter: &mut Reporter<W>) -> Result<RunSummary>
    where
        T: InterruptTrigger,
        W: Write,
    {
        let mut lifecycle = Interactive { trigger, reporter };
        self.execute(None, &mut lifecycle)
    }

    /// Samples exactly `total_samples` points, then returns.
    ///
    /// The budget is split evenly and the last worker takes the remainder.
    pub fn run_fixed(&mut self, total_samples: u64) -> Result<RunSummary> {
        let quotas = split_budget(total_samples, self.config.workers);
        self.execute(Some(quotas), &mut Silent)
    }

    fn execute<L: Lifecycle>(&mut self, quotas: Option<Vec<u64>>, lifecycle: &mut L) -> Result<RunSummary> {
        let workers = self.config.workers;
        let state = SharedState::new(workers);
        self.phase = Phase::Idle;

        let result = thread::scope(|scope| {
            let outcome = self.drive(scope, &state, quotas.as_deref(), lifecycle);
            if outcome.is_err() {
                // Unbounded workers would keep the scope from ever closing.
                state.stop_all();
            }
            outcome
        });

        let (mut outcomes, sampling_time, drain_time) = match result {
            Ok(parts) => parts,
            Err(err) => {
                self.phase = Phase::Done;
                return Err(err);
            }
        };
        let tally = state.tally();
        let history = outcomes
            .iter_mut()
            .find_map(|outcome| outcome.history.take())
            .unwrap_or_default();

        self.phase = Phase::Done;
        info!(
            phase = ?self.phase,
            hits = tally.hits,
            total = tally.total,
            snapshots = history.len(),
            "run finished"
        );

        Ok(RunSummary {
            workers,
            outcomes,
            tally,
            history,
            sampling_time,
            drain_time,
        })
    }

    fn drive<'scope, 'env, L: Lifecycle>(
        &mut self,
        scope: &'scope thread::Scope<'scope, 'env>,
        state: &'env SharedState,
        quotas: Option<&[u64]>,
        lifecycle: &mut L,
    ) -> Result<(Vec<WorkerOutcome>, Duration, Duration)> {
        let workers = state.workers();
        lifecycle.launching(workers)?;

        let mut handles: Vec<ScopedJoinHandle<'scope, WorkerOutcome>> = Vec::with_capacity(workers);
        for id in 0..workers {
            let mut worker = Worker::new(id, state, self.config.seeding);
            if id == REPORTER_WORKER {
                worker = worker.with_recorder(
                    SnapshotRecorder::new(REFERENCE_PI),
                    self.config.analysis_interval,
                );
            }
            if let Some(quotas) = quotas {
                worker = worker.with_quota(quotas[id]);
            }
            let spawned = thread::Builder::new()
                .name(format!("sampler-{id}"))
                .spawn_scoped(scope, move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    abandon(state, handles);
                    return Err(PiError::Spawn { worker: id, source });
                }
            }
        }
        let started = Instant::now();
        self.phase = Phase::Running;
        info!(phase = ?self.phase, workers, "workers launched");

        if let Err(err) = lifecycle.running() {
            abandon(state, handles);
            return Err(err);
        }

        let stopping = Instant::now();
        self.phase = Phase::Draining;
        info!(phase = ?self.phase, "stopping workers");
        if quotas.is_none() {
            for id in 0..workers {
                if let Err(err) = lifecycle.interrupting(id) {
                    abandon(state, handles);
                    return Err(err);
                }
                state.stop(id);
            }
        }

        let mut outcomes = Vec::with_capacity(workers);
        let mut panicked = None;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(outcome) => {
                    debug!(worker = id, total = outcome.tally.total, "worker joined");
                    outcomes.push(outcome);
                }
                Err(_) if panicked.is_none() => panicked = Some(id),
                Err(_) => {}
            }
        }
        if let Some(worker) = panicked {
            return Err(PiError::WorkerPanicked { worker });
        }

        let drain_time = stopping.elapsed();
        let sampling_time = if quotas.is_some() {
            started.elapsed()
        } else {
            stopping.duration_since(started)
        };
        Ok((outcomes, sampling_time, drain_time))
    }
}

/// Stops every worker and joins the ones already spawned.
///
/// Joining here keeps a panicked worker from resurfacing as a panic of the
/// enclosing scope once the run has already failed.
fn abandon<T>(state: &SharedState, handles: Vec<ScopedJoinHandle<'_, T>>) {
    state.stop_all();
    for (id, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            warn!(worker = id, "worker panicked while the run was being abandoned");
        }
    }
}

/// Splits `total` into `workers` quotas, the remainder going to the last one.
pub fn split_budget(total: u64, workers: usize) -> Vec<u64> {
    let workers = workers.max(1) as u64;
    let share = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|id| if id == workers - 1 { share + remainder } else { share })
        .collect()
}
