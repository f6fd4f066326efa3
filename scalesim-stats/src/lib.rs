//! Metrics collection and steady-state analysis.
//!
//! [`MetricsCollector`] is the passive sink every simulation component
//! records into: request lifecycle events keyed by type and priority class,
//! periodic system snapshots, and a chronological timeout log. Its flattened
//! time-ordered exports are the sole inputs of the
//! [`batch-means analyzer`](batch_means), which produces point estimates and
//! Student-t confidence intervals after discarding a warm-up transient.

pub mod batch_means;
pub mod collector;
pub mod error;
pub mod summary;

pub use batch_means::{batch_means_ci, SteadyStateEstimate};
pub use collector::{CompletionRecord, MetricsCollector, SystemSnapshot, TimeoutRecord};
pub use error::AnalysisError;
pub use summary::SummaryReport;
