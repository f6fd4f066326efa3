//! Error types for statistical analysis.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("not enough post-warmup samples: {available} available, {requested} batches requested")]
    InsufficientSamples { available: usize, requested: usize },

    #[error("batch count must be at least 2, got {0}")]
    TooFewBatches(usize),

    #[error("confidence level must lie in (0, 1), got {0}")]
    InvalidConfidence(f64),
}
