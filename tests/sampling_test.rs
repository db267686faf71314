//! End-to-end runs of the coordinator and its worker pool.

use std::time::Duration;

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use monte_carlo_pi::config::{resolve_worker_count, REFERENCE_PI};
use monte_carlo_pi::trigger::{Immediate, TimerTrigger};
use monte_carlo_pi::{Coordinator, PiError, Reporter, RunSummary, SamplerConfig};

fn interactive(config: SamplerConfig, wait: Duration) -> RunSummary {
    let mut coordinator = Coordinator::new(config);
    let mut reporter = Reporter::new(Vec::new());
    coordinator
        .run(&mut TimerTrigger(wait), &mut reporter)
        .unwrap()
}

/// Replays worker `w`'s point stream without going through the engine.
fn reference_hits(seed: u64, worker: u64, samples: u64) -> u64 {
    let mut xs = ChaCha8Rng::seed_from_u64(seed);
    xs.set_stream(worker * 2);
    let mut ys = ChaCha8Rng::seed_from_u64(seed);
    ys.set_stream(worker * 2 + 1);
    let unit = Uniform::new(0.0_f64, 1.0);

    let mut hits = 0;
    for _ in 0..samples {
        let x = unit.sample(&mut xs);
        let y = unit.sample(&mut ys);
        if x * x + y * y <= 1.0 {
            hits += 1;
        }
    }
    hits
}

#[test]
fn test_seeded_run_matches_reference_stream() {
    let seed = 2024;
    let config = SamplerConfig::default().with_workers(4).with_seed(seed);
    let summary = Coordinator::new(config).run_fixed(4_000_000).unwrap();

    assert_eq!(summary.tally.total, 4_000_000);
    let mut expected_hits = 0;
    for outcome in &summary.outcomes {
        assert_eq!(outcome.tally.total, 1_000_000);
        let hits = reference_hits(seed, outcome.id as u64, 1_000_000);
        assert_eq!(outcome.tally.hits, hits, "worker {}", outcome.id);
        expected_hits += hits;
    }

    let expected = 4.0 * expected_hits as f64 / 4_000_000.0;
    let estimate = summary.estimate().unwrap();
    assert!((estimate - expected).abs() < 1e-9, "{estimate} vs {expected}");
}

#[test]
fn test_large_run_converges() {
    let config = SamplerConfig::default().with_workers(4);
    let summary = Coordinator::new(config).run_fixed(10_000_000).unwrap();
    let estimate = summary.estimate().unwrap();
    assert!((estimate - 3.14159).abs() < 0.01, "estimate was {estimate}");
}

#[test]
fn test_hits_never_exceed_total() {
    let summary = interactive(SamplerConfig::default().with_workers(3), Duration::from_millis(50));
    assert!(summary.tally.hits <= summary.tally.total);
    for outcome in &summary.outcomes {
        assert!(outcome.tally.hits <= outcome.tally.total);
    }
    assert_eq!(
        summary.tally.total,
        summary.outcomes.iter().map(|o| o.tally.total).sum::<u64>()
    );
    let estimate = summary.estimate().unwrap();
    assert!(estimate > 0.0 && estimate <= 4.0);
}

#[test]
fn test_history_sample_counts_strictly_increase() {
    let config = SamplerConfig::default()
        .with_workers(4)
        .with_analysis_interval(1_000);
    let summary = interactive(config, Duration::from_millis(150));

    assert!(summary.history.len() >= 2, "only {} snapshots", summary.history.len());
    for pair in summary.history.windows(2) {
        assert!(pair[0].samples < pair[1].samples);
    }
    let last = summary.history.last().unwrap();
    assert!(last.samples <= summary.tally.total);
}

#[test]
fn test_fixed_run_history_cadence() {
    let config = SamplerConfig::default()
        .with_workers(2)
        .with_seed(9)
        .with_analysis_interval(10_000);
    let summary = Coordinator::new(config).run_fixed(200_000).unwrap();

    // Worker 0 samples 100_000 points and snapshots on iterations 0, 10_000, ...
    assert_eq!(summary.history.len(), 10);
    for record in &summary.history {
        assert!(record.deviation.abs() <= 4.0);
    }
}

#[test]
fn test_first_snapshot_deviation_is_reference_minus_estimate() {
    let config = SamplerConfig::default().with_workers(1).with_seed(3);
    let summary = Coordinator::new(config).run_fixed(1).unwrap();

    assert_eq!(summary.history.len(), 1);
    let record = summary.history[0];
    assert_eq!(record.samples, 1);
    let estimate = summary.estimate().unwrap();
    assert!((record.deviation - (REFERENCE_PI - estimate)).abs() < 1e-12);
}

#[test]
fn test_drain_time_is_independent_of_run_length() {
    let short = interactive(SamplerConfig::default().with_workers(2), Duration::from_millis(50));
    let long = interactive(SamplerConfig::default().with_workers(2), Duration::from_millis(500));

    assert!(long.tally.total > short.tally.total);
    assert!(short.drain_time < Duration::from_millis(250), "{:?}", short.drain_time);
    assert!(long.drain_time < Duration::from_millis(250), "{:?}", long.drain_time);
}

#[test]
fn test_undetectable_concurrency_spawns_two_workers() {
    let workers = resolve_worker_count(None);
    let config = SamplerConfig::default().with_workers(workers);
    let summary = interactive(config, Duration::from_millis(10));
    assert_eq!(summary.workers, 2);
    assert_eq!(summary.outcomes.len(), 2);
}

#[test]
fn test_zero_workers_corrected_to_two() {
    let coordinator = Coordinator::new(SamplerConfig::default().with_workers(0));
    assert_eq!(coordinator.workers(), 2);
}

#[test]
fn test_immediate_interrupt_reports_cleanly() {
    let mut coordinator = Coordinator::new(SamplerConfig::default().with_workers(4));
    let mut reporter = Reporter::new(Vec::new());
    let summary = coordinator.run(&mut Immediate, &mut reporter).unwrap();
    reporter.summary(&summary).unwrap();
    let text = String::from_utf8(reporter.into_inner()).unwrap();

    assert!(!text.contains("NaN"));
    match summary.estimate() {
        Ok(estimate) => assert!(estimate > 0.0 && estimate <= 4.0),
        Err(PiError::NoData) => assert!(text.contains("No data")),
        Err(err) => panic!("unexpected error: {err}"),
    }
}

#[test]
fn test_console_output_keeps_narration_free_of_commas() {
    let config = SamplerConfig::default()
        .with_workers(2)
        .with_analysis_interval(1_000);
    let mut coordinator = Coordinator::new(config);
    let mut reporter = Reporter::new(Vec::new());
    let summary = coordinator
        .run(&mut TimerTrigger(Duration::from_millis(50)), &mut reporter)
        .unwrap();
    reporter.summary(&summary).unwrap();
    let text = String::from_utf8(reporter.into_inner()).unwrap();

    let csv: Vec<&str> = text.lines().filter(|line| line.contains(',')).collect();
    assert_eq!(csv.len(), summary.history.len());
    for (line, record) in csv.iter().zip(&summary.history) {
        let (samples, deviation) = line.split_once(',').unwrap();
        assert_eq!(samples.parse::<u64>().unwrap(), record.samples);
        assert!((deviation.parse::<f64>().unwrap() - record.deviation).abs() < 1e-11);
    }
}
