//! Monte Carlo estimation of Pi on a pool of sampling threads.
//!
//! Every worker draws points in the unit square from its own pair of random
//! streams and counts how many fall inside the quarter circle. Worker 0 also
//! records how far the running estimate is from the reference value every
//! [`config::ANALYSIS_INTERVAL`] of its iterations. The coordinator stops the
//! pool when its interrupt trigger returns and aggregates the counts.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod point_source;
pub mod report;
pub mod snapshot;
pub mod state;
pub mod trigger;
pub mod worker;

pub use config::SamplerConfig;
pub use coordinator::{Coordinator, Phase, RunSummary};
pub use error::{PiError, Result};
pub use report::Reporter;
