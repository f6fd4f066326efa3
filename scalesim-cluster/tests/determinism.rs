//! Reproducibility: identically seeded runs must be indistinguishable.

use scalesim_cluster::{ClusterSim, QueueDiscipline, SimConfig};
use scalesim_stats::MetricsCollector;
use std::time::Duration;

fn run(discipline: QueueDiscipline, seeds: (u64, u64, u64)) -> MetricsCollector {
    let mut config = SimConfig::default();
    config.horizon = Duration::from_secs(120);
    config.discipline = discipline;
    config.seeds.arrival = seeds.0;
    config.seeds.selection = seeds.1;
    config.seeds.service = seeds.2;
    ClusterSim::new(config).unwrap().run()
}

fn assert_identical(a: &MetricsCollector, b: &MetricsCollector) {
    assert_eq!(a.total_generated(), b.total_generated());
    assert_eq!(a.total_served(), b.total_served());
    assert_eq!(a.total_timed_out(), b.total_timed_out());
    assert_eq!(a.response_time_series(None), b.response_time_series(None));
    assert_eq!(a.wait_time_series(None), b.wait_time_series(None));
    assert_eq!(a.outcome_stream(None), b.outcome_stream(None));
    assert_eq!(a.timeout_log(), b.timeout_log());
    assert_eq!(a.snapshots(), b.snapshots());
}

#[test]
fn fifo_runs_with_equal_seeds_are_identical() {
    let a = run(QueueDiscipline::Fifo, (11, 22, 33));
    let b = run(QueueDiscipline::Fifo, (11, 22, 33));
    assert_identical(&a, &b);
}

#[test]
fn priority_runs_with_equal_seeds_are_identical() {
    let a = run(QueueDiscipline::StrictPriority, (11, 22, 33));
    let b = run(QueueDiscipline::StrictPriority, (11, 22, 33));
    assert_identical(&a, &b);
}

#[test]
fn different_arrival_seed_changes_the_run() {
    let a = run(QueueDiscipline::Fifo, (11, 22, 33));
    let b = run(QueueDiscipline::Fifo, (12, 22, 33));
    assert_ne!(a.response_time_series(None), b.response_time_series(None));
}

#[test]
fn switching_discipline_preserves_the_generated_traffic() {
    // Same seeds, different scheduling policy. With timeouts disabled the
    // profiler never adjusts, so generation depends only on the three
    // dedicated streams and must be identical under either discipline.
    let mut config = SimConfig::default();
    config.horizon = Duration::from_secs(120);
    for timeout in config.timeouts.values_mut() {
        *timeout = Duration::MAX;
    }

    let mut fifo_config = config.clone();
    fifo_config.discipline = QueueDiscipline::Fifo;
    let fifo = ClusterSim::new(fifo_config).unwrap().run();

    config.discipline = QueueDiscipline::StrictPriority;
    let priority = ClusterSim::new(config).unwrap().run();

    assert_eq!(fifo.total_generated(), priority.total_generated());
    for kind in scalesim_core::RequestType::ALL {
        assert_eq!(fifo.generated_count(kind), priority.generated_count(kind));
    }
}
