//! What the coordinator blocks on while workers run.

use std::io::{self, BufRead};
use std::time::Duration;

use tracing::warn;

/// Blocks until the run should stop.
pub trait InterruptTrigger {
    fn wait(&mut self);
}

/// Returns once a line, end-of-stream, or a read error arrives on stdin.
#[derive(Debug, Default)]
pub struct StdinTrigger;

impl InterruptTrigger for StdinTrigger {
    fn wait(&mut self) {
        wait_for_line(io::stdin().lock());
    }
}

/// Returns after the reader yields a line, reaches EOF, or fails.
pub fn wait_for_line<R: BufRead>(mut reader: R) {
    let mut line = String::new();
    if let Err(err) = reader.read_line(&mut line) {
        warn!(%err, "interrupt input unreadable, stopping anyway");
    }
}

/// Returns after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct TimerTrigger(pub Duration);

impl InterruptTrigger for TimerTrigger {
    fn wait(&mut self) {
        std::thread::sleep(self.0);
    }
}

/// Returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

impl InterruptTrigger for Immediate {
    fn wait(&mut self) {}
}
