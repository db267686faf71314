//! The sampling loop run by every worker thread.

use tracing::debug;

use crate::point_source::{is_inside, PointSource, Seeding};
use crate::snapshot::{DeviationHistory, SnapshotRecorder};
use crate::state::{SharedState, Tally, WorkerId};

/// What a worker hands back when its loop ends.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub id: WorkerId,
    pub tally: Tally,
    /// Present only for the reporter worker.
    pub history: Option<DeviationHistory>,
}

pub struct Worker<'a> {
    id: WorkerId,
    state: &'a SharedState,
    source: PointSource,
    recorder: Option<SnapshotRecorder>,
    analysis_interval: u64,
    quota: Option<u64>,
}

impl<'a> Worker<'a> {
    pub fn new(id: WorkerId, state: &'a SharedState, seeding: Seeding) -> Self {
        Self {
            id,
            state,
            source: PointSource::new(seeding, id),
            recorder: None,
            analysis_interval: 0,
            quota: None,
        }
    }

    /// Makes this worker take a snapshot every `interval` of its iterations.
    pub fn with_recorder(mut self, recorder: SnapshotRecorder, interval: u64) -> Self {
        self.recorder = Some(recorder);
        self.analysis_interval = interval;
        self
    }

    /// Caps the number of points this worker generates.
    pub fn with_quota(mut self, quota: u64) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Samples until the stop flag is raised or the quota is used up.
    ///
    /// The flag is checked before every point, so a worker stopped ahead of
    /// its first iteration generates nothing.
    pub fn run(mut self) -> WorkerOutcome {
        let slot = self.state.counters(self.id);
        let mut hits = 0_u64;
        let mut total = 0_u64;

        debug!(worker = self.id, "sampling started");
        loop {
            if self.state.should_stop(self.id) {
                break;
            }
            if self.quota.is_some_and(|quota| total >= quota) {
                break;
            }

            let (x, y) = self.source.next_point();
            if is_inside(x, y) {
                hits += 1;
            }
            let iteration = total;
            total += 1;
            slot.publish(hits, total);

            if let Some(recorder) = self.recorder.as_mut() {
                if self.analysis_interval != 0 && iteration % self.analysis_interval == 0 {
                    recorder.record(self.state);
                }
            }
        }
        debug!(worker = self.id, hits, total, "sampling stopped");

        WorkerOutcome {
            id: self.id,
            tally: Tally::new(hits, total),
            history: self.recorder.map(SnapshotRecorder::into_history),
        }
    }
}
