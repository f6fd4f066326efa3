//! Structured logging setup for simulation runs.
//!
//! Components log through `tracing` macros with structured fields
//! (request ids, worker ids, queue lengths). The default filter keeps INFO
//! and above; `RUST_LOG` overrides everything, e.g.
//! `RUST_LOG=scalesim_cluster=debug` to watch scheduling decisions.

use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with the default `info` level.
pub fn init_simulation_logging() {
    init_simulation_logging_with_level("info");
}

/// Initialize logging at the given level ("trace" through "error").
/// `RUST_LOG` in the environment takes precedence. Safe to call once per
/// process; later calls are ignored.
pub fn init_simulation_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scalesim_core={level},scalesim_cluster={level},scalesim_stats={level}")));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .try_init();
}
