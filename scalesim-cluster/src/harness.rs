//! Scenario wiring.
//!
//! Builds every component from a validated [`SimConfig`], connects them
//! through shared handles and component keys, seeds the initial events, and
//! runs the simulation to its horizon.

use crate::autoscaler::{AutoscaleEvent, Autoscaler};
use crate::config::{QueueDiscipline, SimConfig};
use crate::generator::{Generator, GeneratorEvent};
use crate::pool::{PoolEvent, WorkerPool};
use crate::profiler::TrafficProfiler;
use crate::queue::{FifoAdmission, PriorityAdmission, SharedQueue};
use crate::sampler::{SampleEvent, SystemSampler};
use crate::service::ServiceTimeSampler;
use crate::watcher::TimeoutWatcher;
use crate::SharedMetrics;
use scalesim_core::{ConfigError, Executor, RngStreams, SimTime, Simulation};
use scalesim_stats::MetricsCollector;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::info;

/// A fully wired scenario, ready to run.
pub struct ClusterSim {
    sim: Simulation,
    metrics: SharedMetrics,
    horizon: SimTime,
}

impl ClusterSim {
    /// Validate the configuration and wire all components. Every
    /// configuration error surfaces here, before any virtual time passes.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let metrics: SharedMetrics = Rc::new(RefCell::new(MetricsCollector::new()));
        let queue: SharedQueue = match config.discipline {
            QueueDiscipline::Fifo => Rc::new(RefCell::new(FifoAdmission::new())),
            QueueDiscipline::StrictPriority => Rc::new(RefCell::new(PriorityAdmission::new())),
        };
        let replicas = Rc::new(Cell::new(0usize));
        let streams = RngStreams::from_seeds(
            config.seeds.arrival,
            config.seeds.selection,
            config.seeds.service,
        );

        let mut sim = Simulation::default();

        let watcher = sim.add_component(TimeoutWatcher::new(Rc::clone(&metrics)));
        let pool = sim.add_component(WorkerPool::new(
            Rc::clone(&queue),
            Rc::clone(&metrics),
            Rc::clone(&replicas),
        ));
        let generator = sim.add_component(Generator::new(
            config.arrival,
            TrafficProfiler::new(
                &config.traffic_shares,
                config.funnel_dependencies.clone(),
                config.funnel_min_samples,
                Rc::clone(&metrics),
            ),
            ServiceTimeSampler::new(&config.service_times)?,
            config.timeouts.clone(),
            config.priorities.clone(),
            streams,
            Rc::clone(&metrics),
            pool,
            watcher,
        ));
        let sampler = sim.add_component(SystemSampler::new(
            config.sample_period,
            Rc::clone(&queue),
            Rc::clone(&replicas),
            Rc::clone(&metrics),
        ));

        // Initial events, in a fixed order: the pool reaches its initial size
        // before the first arrival can be drawn or the first sample taken.
        sim.schedule(SimTime::zero(), pool, PoolEvent::Resize(config.initial_replicas));
        sim.schedule(SimTime::zero(), generator, GeneratorEvent::RateProbe);
        sim.schedule(SimTime::zero(), sampler, SampleEvent::Tick);

        if config.autoscaler.enabled {
            let scaler = sim.add_component(Autoscaler::new(
                config.autoscaler.clone(),
                config.min_replicas,
                config.max_replicas,
                Rc::clone(&queue),
                Rc::clone(&replicas),
                pool,
            ));
            sim.schedule(
                SimTime::from_duration(config.autoscaler.sync_period),
                scaler,
                AutoscaleEvent::Tick,
            );
        }

        info!(
            discipline = ?config.discipline,
            horizon = ?config.horizon,
            initial_replicas = config.initial_replicas,
            "scenario wired"
        );

        Ok(Self {
            sim,
            metrics,
            horizon: SimTime::from_duration(config.horizon),
        })
    }

    /// Run to the horizon and hand back the collected metrics. Tasks still
    /// suspended past the horizon are abandoned without side effects.
    pub fn run(mut self) -> MetricsCollector {
        self.sim.execute(Executor::timed(self.horizon));
        info!(final_time = %self.sim.time(), "simulation finished");
        // The components (dropped with the simulation) hold the other strong
        // references to the collector.
        drop(self.sim);
        Rc::try_unwrap(self.metrics)
            .expect("all collector handles released at shutdown")
            .into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalesim_core::RequestType;
    use std::time::Duration;

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut config = SimConfig::default();
        config.autoscaler.target_queue_per_worker = -1.0;
        assert!(ClusterSim::new(config).is_err());
    }

    #[test]
    fn default_scenario_produces_traffic_and_snapshots() {
        let mut config = SimConfig::default();
        config.horizon = Duration::from_secs(30);
        let metrics = ClusterSim::new(config).unwrap().run();

        assert!(metrics.total_generated() > 0);
        assert!(metrics.total_served() > 0);
        // Snapshots at 0..=30 inclusive.
        assert_eq!(metrics.snapshots().len(), 31);
        // Conservation: nothing terminates more than once.
        assert!(metrics.total_generated() >= metrics.total_served() + metrics.total_timed_out());
        // All five types get traffic under the default shares.
        for kind in RequestType::ALL {
            assert!(metrics.generated_count(kind) > 0, "no {kind} traffic");
        }
    }
}
