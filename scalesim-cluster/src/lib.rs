//! Autoscaling request-serving cluster simulation.
//!
//! Models a cluster that serves randomly arriving, typed requests with a
//! dynamically sized worker pool, per-request deadlines, and a queue-pressure
//! autoscaler, under either FIFO or strict-priority admission. The purpose is
//! comparing loss/latency outcomes between the two disciplines under
//! controlled, reproducible traffic.
//!
//! The cooperating actors (all [`scalesim_core::Component`]s driven by one
//! deterministic event loop):
//!
//! - [`generator::Generator`]: arrivals, with adaptive type selection via
//!   the [`profiler::TrafficProfiler`] and crystallized service times from
//!   the [`service::ServiceTimeSampler`];
//! - [`pool::WorkerPool`]: the admission store plus the worker roster;
//! - [`watcher::TimeoutWatcher`]: per-request deadline enforcement;
//! - [`autoscaler::Autoscaler`]: the periodic scaling control loop;
//! - [`sampler::SystemSampler`]: periodic state snapshots.
//!
//! [`ClusterSim`] wires a whole scenario from a [`SimConfig`] and runs it to
//! the horizon:
//!
//! ```
//! use scalesim_cluster::{ClusterSim, SimConfig};
//!
//! let mut config = SimConfig::default();
//! config.horizon = std::time::Duration::from_secs(10);
//! let metrics = ClusterSim::new(config).unwrap().run();
//! assert!(metrics.total_generated() > 0);
//! ```

pub mod autoscaler;
pub mod config;
pub mod generator;
pub mod harness;
pub mod pool;
pub mod profiler;
pub mod queue;
pub mod sampler;
pub mod service;
pub mod watcher;

use scalesim_stats::MetricsCollector;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to the run's metrics collector. Single simulation thread,
/// so `Rc<RefCell<_>>` is all the synchronization there is.
pub type SharedMetrics = Rc<RefCell<MetricsCollector>>;

pub use config::{ArrivalProfile, AutoscalerConfig, QueueDiscipline, SimConfig, StreamSeeds};
pub use harness::ClusterSim;
pub use queue::{AdmissionQueue, FifoAdmission, PriorityAdmission, SharedQueue};
