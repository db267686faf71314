//! Periodic accuracy snapshots taken by the reporter worker.

use tracing::debug;

use crate::state::SharedState;

/// How far the running estimate was from the reference at one moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationRecord {
    /// Samples generated across all workers when the snapshot was taken.
    pub samples: u64,
    /// Reference minus estimate. Positive means the estimate was low.
    pub deviation: f64,
}

pub type DeviationHistory = Vec<DeviationRecord>;

/// Appends snapshots to a history it owns.
///
/// Only the reporter worker holds a recorder, so appends are never
/// concurrent. The history is handed back when that worker returns.
#[derive(Debug)]
pub struct SnapshotRecorder {
    reference: f64,
    history: DeviationHistory,
}

impl SnapshotRecorder {
    pub fn new(reference: f64) -> Self {
        Self {
            reference,
            history: Vec::new(),
        }
    }

    /// Aggregates every worker's current counts and records the deviation.
    ///
    /// Nothing is recorded while no sample exists yet.
    pub fn record(&mut self, state: &SharedState) {
        let tally = state.tally();
        let Some(estimate) = tally.estimate() else {
            return;
        };
        let record = DeviationRecord {
            samples: tally.total,
            deviation: self.reference - estimate,
        };
        debug!(samples = record.samples, deviation = record.deviation, "snapshot");
        self.history.push(record);
    }

    pub fn into_history(self) -> DeviationHistory {
        self.history
    }
}
