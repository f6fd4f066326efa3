//! End-to-end scenario properties.

use scalesim_cluster::{ArrivalProfile, ClusterSim, QueueDiscipline, SimConfig};
use scalesim_core::{Priority, RequestType, SimTime};
use scalesim_stats::{batch_means_ci, MetricsCollector, SummaryReport};
use std::collections::BTreeMap;
use std::time::Duration;

/// A fixed-size pool: autoscaler off, bounds pinned.
fn fixed_pool(config: &mut SimConfig, workers: usize) {
    config.autoscaler.enabled = false;
    config.initial_replicas = workers;
    config.min_replicas = workers;
    config.max_replicas = workers;
}

fn generated_by_priority(metrics: &MetricsCollector, priorities: &BTreeMap<RequestType, Priority>) -> BTreeMap<Priority, u64> {
    let mut counts = BTreeMap::new();
    for (&kind, &priority) in priorities {
        *counts.entry(priority).or_insert(0) += metrics.generated_count(kind);
    }
    counts
}

#[test]
fn under_capacity_run_with_infinite_timeouts_loses_nothing() {
    let mut config = SimConfig::default();
    fixed_pool(&mut config, 1);
    // One worker with ~0.09s mean service handles 0.5 req/s trivially.
    // Arrivals stop at t = 100s and the horizon leaves ample drain time.
    config.arrival = ArrivalProfile::Pulse {
        rate: 0.5,
        active_for: Duration::from_secs(100),
    };
    config.horizon = Duration::from_secs(1000);
    for timeout in config.timeouts.values_mut() {
        *timeout = Duration::MAX;
    }

    let metrics = ClusterSim::new(config).unwrap().run();
    assert!(metrics.total_generated() > 0);
    assert_eq!(metrics.total_timed_out(), 0);
    assert_eq!(metrics.total_served(), metrics.total_generated());
}

#[test]
fn drained_horizon_gives_every_request_exactly_one_outcome() {
    let mut config = SimConfig::default();
    fixed_pool(&mut config, 1);
    // Heavy overload for 50s, then silence: by the horizon every request has
    // either completed or expired, never both, never neither.
    config.arrival = ArrivalProfile::Pulse {
        rate: 50.0,
        active_for: Duration::from_secs(50),
    };
    config.horizon = Duration::from_secs(500);

    let metrics = ClusterSim::new(config).unwrap().run();
    assert!(metrics.total_generated() > 0);
    assert!(metrics.total_timed_out() > 0);
    assert_eq!(
        metrics.total_served() + metrics.total_timed_out(),
        metrics.total_generated()
    );
    // Per-type conservation as well.
    for kind in RequestType::ALL {
        assert_eq!(
            metrics.served_count(kind) + metrics.timed_out_count(kind),
            metrics.generated_count(kind),
            "type {kind} leaked a request"
        );
    }
}

#[test]
fn completion_records_satisfy_response_and_wait_invariants() {
    let mut config = SimConfig::default();
    config.horizon = Duration::from_secs(60);
    let metrics = ClusterSim::new(config).unwrap().run();

    let mut checked = 0;
    for kind in RequestType::ALL {
        for record in metrics.completions(kind) {
            assert!(record.response >= record.wait, "response below wait");
            // completion = arrival + response, so the completion stamp can
            // never precede the response interval itself.
            assert!(record.completed_at.as_duration() >= record.response);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn strict_priority_never_inverts_class_loss_under_overload() {
    // Sustained overload against a pinned two-worker pool. HIGH carries the
    // tighter deadline; strict priority must still protect it: the HIGH
    // class's loss probability stays at or below the LOW class's.
    let mut config = SimConfig::default();
    fixed_pool(&mut config, 2);
    config.discipline = QueueDiscipline::StrictPriority;
    config.horizon = Duration::from_secs(300);

    let metrics = ClusterSim::new(config.clone()).unwrap().run();
    let generated = generated_by_priority(&metrics, &config.priorities);

    let loss = |priority: Priority| {
        let lost = metrics.timed_out_count_by_priority(priority) as f64;
        lost / generated[&priority] as f64
    };

    assert!(generated[&Priority::High] > 100);
    assert!(generated[&Priority::Low] > 100);
    assert!(
        loss(Priority::High) <= loss(Priority::Low),
        "priority inversion: high loss {} > low loss {}",
        loss(Priority::High),
        loss(Priority::Low)
    );
}

#[test]
fn priority_discipline_beats_fifo_for_the_protected_class() {
    let mut base = SimConfig::default();
    fixed_pool(&mut base, 2);
    base.horizon = Duration::from_secs(300);

    let mut fifo_config = base.clone();
    fifo_config.discipline = QueueDiscipline::Fifo;
    let fifo = ClusterSim::new(fifo_config).unwrap().run();

    let mut priority_config = base.clone();
    priority_config.discipline = QueueDiscipline::StrictPriority;
    let priority = ClusterSim::new(priority_config).unwrap().run();

    let high_loss = |metrics: &MetricsCollector| {
        let generated = generated_by_priority(metrics, &base.priorities);
        metrics.timed_out_count_by_priority(Priority::High) as f64
            / generated[&Priority::High] as f64
    };

    // Under FIFO overload the tight-deadline classes drown with everyone
    // else; strict priority is the whole point of the comparison.
    assert!(
        high_loss(&priority) < high_loss(&fifo),
        "priority scheduling did not reduce high-class loss ({} vs {})",
        high_loss(&priority),
        high_loss(&fifo)
    );
}

#[test]
fn outcome_stream_agrees_with_counters_and_feeds_batch_means() {
    let mut config = SimConfig::default();
    config.horizon = Duration::from_secs(120);
    let metrics = ClusterSim::new(config).unwrap().run();

    let stream = metrics.outcome_stream(None);
    let losses = stream.iter().filter(|(_, o)| *o == 1).count() as u64;
    let serves = stream.iter().filter(|(_, o)| *o == 0).count() as u64;
    assert_eq!(losses, metrics.total_timed_out());
    assert_eq!(serves, metrics.total_served());
    assert!(stream.windows(2).all(|w| w[0].0 <= w[1].0), "stream not time-ordered");

    // The flattened response series is directly consumable by the analyzer.
    let series = metrics.response_time_series(None);
    let estimate = batch_means_ci(&series, SimTime::from_secs(30), 8, 0.95).unwrap();
    assert!(estimate.mean > 0.0);
    assert!(estimate.half_width >= 0.0);
    assert!(estimate.ci.0 <= estimate.mean && estimate.mean <= estimate.ci.1);

    // And the summary renders.
    let report = SummaryReport::from_collector(&metrics);
    assert_eq!(report.total_generated, metrics.total_generated());
    assert!(report.to_string().contains("by priority"));
}
