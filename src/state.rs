//! Counters and stop flags shared between the coordinator and its workers.
//!
//! Each counter slot has exactly one writer, its worker. Readers (the
//! snapshot recorder while the run is live, the coordinator after join) see
//! values that may lag behind the writer; that is accepted for snapshots.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Index of a worker in every shared array, in `0..workers`.
pub type WorkerId = usize;

/// Hit and total counts of one worker.
#[derive(Debug, Default)]
pub struct CounterSlot {
    hits: AtomicU64,
    total: AtomicU64,
}

impl CounterSlot {
    /// Publishes the owning worker's running counts.
    ///
    /// `total` is stored before `hits` so that a reader going through
    /// [`CounterSlot::load`] never observes `hits > total`.
    #[inline]
    pub fn publish(&self, hits: u64, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.hits.store(hits, Ordering::Release);
    }

    /// Returns `(hits, total)`.
    #[inline]
    pub fn load(&self) -> (u64, u64) {
        let hits = self.hits.load(Ordering::Acquire);
        let total = self.total.load(Ordering::Relaxed);
        (hits, total)
    }
}

/// Sum of counts over a set of workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: u64,
    pub total: u64,
}

impl Tally {
    pub fn new(hits: u64, total: u64) -> Self {
        Self { hits, total }
    }

    /// `4 * hits / total`, or `None` before the first sample.
    pub fn estimate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(4.0 * self.hits as f64 / self.total as f64)
    }
}

impl std::ops::Add for Tally {
    type Output = Tally;

    fn add(self, other: Tally) -> Tally {
        Tally {
            hits: self.hits + other.hits,
            total: self.total + other.total,
        }
    }
}

impl std::iter::Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Tally {
        iter.fold(Tally::default(), |acc, t| acc + t)
    }
}

/// State owned by the coordinator and borrowed by every worker.
#[derive(Debug)]
pub struct SharedState {
    counters: Vec<CachePadded<CounterSlot>>,
    stop: Vec<CachePadded<AtomicBool>>,
}

impl SharedState {
    pub fn new(workers: usize) -> Self {
        Self {
            counters: (0..workers).map(|_| CachePadded::default()).collect(),
            stop: (0..workers).map(|_| CachePadded::new(AtomicBool::new(false))).collect(),
        }
    }

    pub fn workers(&self) -> usize {
        self.counters.len()
    }

    pub fn counters(&self, worker: WorkerId) -> &CounterSlot {
        &self.counters[worker]
    }

    /// Raises the stop flag of one worker.
    pub fn stop(&self, worker: WorkerId) {
        self.stop[worker].store(true, Ordering::Release);
    }

    pub fn stop_all(&self) {
        for worker in 0..self.workers() {
            self.stop(worker);
        }
    }

    #[inline]
    pub fn should_stop(&self, worker: WorkerId) -> bool {
        self.stop[worker].load(Ordering::Acquire)
    }

    /// Sums every worker's current counts, the reporter included.
    pub fn tally(&self) -> Tally {
        self.counters
            .iter()
            .map(|slot| {
                let (hits, total) = slot.load();
                Tally::new(hits, total)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = SharedState::new(4);
        assert_eq!(state.workers(), 4);
        assert_eq!(state.tally(), Tally::default());
        assert!((0..4).all(|w| !state.should_stop(w)));
    }

    #[test]
    fn test_stop_is_per_worker() {
        let state = SharedState::new(3);
        state.stop(1);
        assert!(!state.should_stop(0));
        assert!(state.should_stop(1));
        assert!(!state.should_stop(2));
        state.stop_all();
        assert!((0..3).all(|w| state.should_stop(w)));
    }

    #[test]
    fn test_tally_includes_every_slot() {
        let state = SharedState::new(3);
        state.counters(0).publish(5, 7);
        state.counters(1).publish(1, 2);
        state.counters(2).publish(0, 4);
        assert_eq!(state.tally(), Tally::new(6, 13));
    }

    #[test]
    fn test_estimate_guards_zero_total() {
        assert_eq!(Tally::default().estimate(), None);
        assert_eq!(Tally::new(3, 4).estimate(), Some(3.0));
    }

    #[test]
    fn test_concurrent_reader_never_sees_hits_above_total() {
        let state = SharedState::new(1);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let mut hits = 0;
                for total in 1..=200_000_u64 {
                    if total % 4 != 0 {
                        hits += 1;
                    }
                    state.counters(0).publish(hits, total);
                }
            });
            for _ in 0..10_000 {
                let (hits, total) = state.counters(0).load();
                assert!(hits <= total);
            }
        });
    }
}
