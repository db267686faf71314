//! Error types for the sampling engine.

use thiserror::Error;

use crate::state::WorkerId;

/// Errors surfaced by the coordinator and reporter.
#[derive(Debug, Error)]
pub enum PiError {
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: WorkerId,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before returning its counts.
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: WorkerId },

    /// No point was generated before the run stopped.
    #[error("no data: the run stopped before any sample was generated")]
    NoData,

    /// Writing the console report failed.
    #[error("report output failed: {0}")]
    Report(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PiError>;
