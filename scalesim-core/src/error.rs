//! Error types for the simulation core.

use thiserror::Error;

/// Top-level error for simulation setup and execution.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("component not found with id: {id}")]
    ComponentNotFound { id: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration problems, surfaced before the simulation starts rather than
/// silently defaulted at runtime.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log-normal distribution requires a positive mean, got {mean}")]
    NonPositiveMean { mean: f64 },

    #[error("log-normal distribution requires a non-negative stdev, got {stdev}")]
    NegativeStdev { stdev: f64 },

    #[error("exponential distribution requires a positive scale, got {scale}")]
    NonPositiveScale { scale: f64 },

    #[error("target queue length per worker must be positive, got {target}")]
    NonPositiveQueueTarget { target: f64 },

    #[error("worker bounds inverted: min {min} > max {max}")]
    InvertedWorkerBounds { min: usize, max: usize },

    #[error("initial replica count {initial} outside worker bounds [{min}, {max}]")]
    InitialOutsideBounds { initial: usize, min: usize, max: usize },

    #[error("traffic profile is empty")]
    EmptyTrafficProfile,

    #[error("traffic shares must be non-negative and sum to a positive value")]
    DegenerateTrafficShares,

    #[error("request type {kind} has no {what} configured")]
    MissingPerTypeEntry { kind: String, what: &'static str },

    #[error("autoscaler sync period must be positive")]
    ZeroSyncPeriod,
}
