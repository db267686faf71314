//! Per-worker random point streams.
//!
//! Every worker owns one [`PointSource`] made of two independent ChaCha8
//! streams, one per axis. With [`Seeding::Fixed`], worker `w` draws X from
//! stream `2w` and Y from stream `2w + 1` of `ChaCha8Rng::seed_from_u64(seed)`,
//! so a seeded run can be replayed outside the engine.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::{Distribution, Uniform};
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::state::WorkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeding {
    /// Seed from the OS entropy source, falling back to the clock.
    Entropy,
    /// Reproducible streams derived from one seed.
    Fixed(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
}

/// ChaCha stream index used for one axis of one worker.
pub fn stream_index(worker: WorkerId, axis: Axis) -> u64 {
    worker as u64 * 2 + axis as u64
}

/// One coordinate stream, uniform over [0, 1).
#[derive(Debug, Clone)]
pub struct AxisStream {
    rng: ChaCha8Rng,
    range: Uniform<f64>,
}

impl AxisStream {
    pub fn new(seeding: Seeding, worker: WorkerId, axis: Axis) -> Self {
        let stream = stream_index(worker, axis);
        let rng = match seeding {
            Seeding::Fixed(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(stream);
                rng
            }
            Seeding::Entropy => seed_from_entropy(OsRng, stream),
        };
        Self::with_rng(rng)
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            range: Uniform::new(0.0, 1.0),
        }
    }

    #[inline]
    pub fn next_coordinate(&mut self) -> f64 {
        self.range.sample(&mut self.rng)
    }
}

/// Seeds one stream from `source`, or from the clock if `source` fails.
fn seed_from_entropy<R: RngCore>(source: R, stream: u64) -> ChaCha8Rng {
    ChaCha8Rng::from_rng(source).unwrap_or_else(|err| {
        debug!(stream, %err, "entropy source unavailable, seeding from clock");
        ChaCha8Rng::seed_from_u64(clock_seed() ^ stream.rotate_left(32))
    })
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15)
}

/// The pair of streams a single worker samples from.
#[derive(Debug, Clone)]
pub struct PointSource {
    x: AxisStream,
    y: AxisStream,
}

impl PointSource {
    pub fn new(seeding: Seeding, worker: WorkerId) -> Self {
        Self {
            x: AxisStream::new(seeding, worker, Axis::X),
            y: AxisStream::new(seeding, worker, Axis::Y),
        }
    }

    #[inline]
    pub fn next_point(&mut self) -> (f64, f64) {
        let x = self.x.next_coordinate();
        let y = self.y.next_coordinate();
        (x, y)
    }
}

/// Whether `(x, y)` lies within the unit quarter circle.
#[inline]
pub fn is_inside(x: f64, y: f64) -> bool {
    x * x + y * y <= 1.0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn classification_away_from_the_arc(x in 0.0_f64..1.0, y in 0.0_f64..1.0) {
            let radius = x.hypot(y);
            prop_assume!((radius - 1.0).abs() > 1e-9);
            prop_assert_eq!(is_inside(x, y), radius < 1.0);
        }

        #[test]
        fn seeded_streams_stay_in_range(seed in any::<u64>(), worker in 0_usize..64) {
            let mut source = PointSource::new(Seeding::Fixed(seed), worker);
            for _ in 0..32 {
                let (x, y) = source.next_point();
                prop_assert!((0.0..1.0).contains(&x));
                prop_assert!((0.0..1.0).contains(&y));
            }
        }
    }
}
