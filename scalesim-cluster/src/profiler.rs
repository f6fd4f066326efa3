//! Adaptive traffic profiling.
//!
//! The profiler turns observed loss into feedback on the offered mix: a
//! request type that causally depends on another (a funnel edge, e.g. "add to
//! cart" depends on "browse") is generated less often when its source type is
//! being lost. Health of a source = 1 − its observed loss rate, applied as a
//! multiplier on each dependent's base share, with a cold-start guard until
//! the source has enough samples.

use crate::SharedMetrics;
use scalesim_core::RequestType;
use std::collections::BTreeMap;

pub struct TrafficProfiler {
    /// Base shares in stable type order, normalized at construction.
    base: Vec<(RequestType, f64)>,
    /// dependent → source funnel edges.
    dependencies: BTreeMap<RequestType, RequestType>,
    /// Generated-count threshold below which a source's health is fixed at 1.
    min_samples: u64,
    metrics: SharedMetrics,
}

impl TrafficProfiler {
    pub fn new(
        shares: &BTreeMap<RequestType, f64>,
        dependencies: BTreeMap<RequestType, RequestType>,
        min_samples: u64,
        metrics: SharedMetrics,
    ) -> Self {
        let total: f64 = shares.values().sum();
        let base = shares
            .iter()
            .map(|(&kind, &share)| (kind, share / total))
            .collect();
        Self {
            base,
            dependencies,
            min_samples,
            metrics,
        }
    }

    /// Current probability table over request types, renormalized to sum to 1.
    ///
    /// If every adjusted probability collapses to zero (all sources fully
    /// lossy), the unmodified base table is returned instead.
    pub fn current_probabilities(&self) -> Vec<(RequestType, f64)> {
        let mut adjusted: Vec<(RequestType, f64)> = self
            .base
            .iter()
            .map(|&(kind, share)| match self.dependencies.get(&kind) {
                Some(&source) => (kind, share * self.health_factor(source)),
                None => (kind, share),
            })
            .collect();

        let total: f64 = adjusted.iter().map(|(_, p)| p).sum();
        if total <= 0.0 {
            return self.base.clone();
        }
        for (_, p) in &mut adjusted {
            *p /= total;
        }
        adjusted
    }

    /// 1 − loss rate of `source`, or 1 during cold start.
    fn health_factor(&self, source: RequestType) -> f64 {
        let metrics = self.metrics.borrow();
        if metrics.generated_count(source) < self.min_samples {
            return 1.0;
        }
        1.0 - metrics.loss_rate(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalesim_core::{Priority, SimTime};
    use scalesim_stats::MetricsCollector;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shares() -> BTreeMap<RequestType, f64> {
        BTreeMap::from([
            (RequestType::Browse, 0.5),
            (RequestType::CartAdd, 0.3),
            (RequestType::Telemetry, 0.2),
        ])
    }

    fn deps() -> BTreeMap<RequestType, RequestType> {
        BTreeMap::from([(RequestType::CartAdd, RequestType::Browse)])
    }

    fn profiler_with(metrics: SharedMetrics) -> TrafficProfiler {
        TrafficProfiler::new(&shares(), deps(), 50, metrics)
    }

    fn probability(table: &[(RequestType, f64)], kind: RequestType) -> f64 {
        table.iter().find(|(k, _)| *k == kind).unwrap().1
    }

    #[test]
    fn cold_start_returns_base_table() {
        let metrics = Rc::new(RefCell::new(MetricsCollector::new()));
        let profiler = profiler_with(metrics.clone());

        // A few losses, but below the sample threshold: no adjustment.
        for _ in 0..10 {
            metrics.borrow_mut().record_generated(RequestType::Browse);
        }
        metrics
            .borrow_mut()
            .record_timeout(SimTime::from_secs(1), RequestType::Browse, Priority::High);

        let table = profiler.current_probabilities();
        assert!((probability(&table, RequestType::CartAdd) - 0.3).abs() < 1e-12);
        let total: f64 = table.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lossy_source_suppresses_dependents() {
        let metrics = Rc::new(RefCell::new(MetricsCollector::new()));
        let profiler = profiler_with(metrics.clone());

        // 100 generated, 50 lost: health = 0.5, CartAdd share halves.
        {
            let mut m = metrics.borrow_mut();
            for _ in 0..100 {
                m.record_generated(RequestType::Browse);
            }
            for _ in 0..50 {
                m.record_timeout(SimTime::from_secs(1), RequestType::Browse, Priority::High);
            }
        }

        let table = profiler.current_probabilities();
        // Raw masses: browse 0.5, cart_add 0.15, telemetry 0.2 → total 0.85.
        assert!((probability(&table, RequestType::CartAdd) - 0.15 / 0.85).abs() < 1e-12);
        assert!((probability(&table, RequestType::Browse) - 0.5 / 0.85).abs() < 1e-12);
        let total: f64 = table.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn total_collapse_falls_back_to_base() {
        // Every type depends on a fully lossy source.
        let shares = BTreeMap::from([(RequestType::CartAdd, 1.0)]);
        let deps = BTreeMap::from([(RequestType::CartAdd, RequestType::Browse)]);
        let metrics = Rc::new(RefCell::new(MetricsCollector::new()));
        {
            let mut m = metrics.borrow_mut();
            for _ in 0..100 {
                m.record_generated(RequestType::Browse);
                m.record_timeout(SimTime::from_secs(1), RequestType::Browse, Priority::High);
            }
        }
        let profiler = TrafficProfiler::new(&shares, deps, 50, metrics);
        let table = profiler.current_probabilities();
        assert_eq!(table, vec![(RequestType::CartAdd, 1.0)]);
    }
}
