//! Console narration and the CSV deviation stream.
//!
//! Only deviation records are written with a comma, so a consumer can keep
//! the machine-readable part with a "line contains a comma" filter.

use std::io::{self, Write};

use crate::coordinator::RunSummary;
use crate::state::WorkerId;

pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn launching(&mut self, workers: usize) -> io::Result<()> {
        writeln!(self.out, "Launching {workers} sampling workers.")
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        writeln!(self.out, "Press Enter to stop sampling.")?;
        self.out.flush()
    }

    pub fn interrupting(&mut self, worker: WorkerId) -> io::Result<()> {
        writeln!(
            self.out,
            "Sending interrupt signal to worker {worker} and waiting for it to finish."
        )
    }

    /// Writes the final estimate, per-worker counts, and the deviation history.
    pub fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        match summary.estimate() {
            Ok(estimate) => writeln!(
                self.out,
                "Calculated Pi value of {estimate:.9} using {} points.",
                summary.tally.total
            )?,
            Err(_) => writeln!(
                self.out,
                "No data: the run stopped before any point was generated."
            )?,
        }

        for outcome in &summary.outcomes {
            writeln!(
                self.out,
                "Worker {} generated {} points with {} hits.",
                outcome.id, outcome.tally.total, outcome.tally.hits
            )?;
        }

        write!(self.out, "Sampling time: {}ms", summary.sampling_time.as_millis())?;
        if let Some(rate) = summary.samples_per_second() {
            write!(self.out, " ({rate:.0} points per second)")?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "Drain time: {}ms", summary.drain_time.as_millis())?;

        writeln!(self.out, "Deviation at given points (CSV safe):")?;
        for record in &summary.history {
            writeln!(self.out, "{},{:.12}", record.samples, record.deviation)?;
        }
        self.out.flush()
    }
}
