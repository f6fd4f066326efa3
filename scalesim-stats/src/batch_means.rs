//! Batch-means steady-state estimation.
//!
//! Classic variance-reduction scheme for simulation output analysis: discard
//! the warm-up transient, split the remaining time-ordered samples into equal
//! contiguous batches, and treat the batch means as (approximately
//! independent) observations. The confidence interval comes from a Student-t
//! critical value with batches − 1 degrees of freedom.

use crate::error::AnalysisError;
use scalesim_core::SimTime;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Point estimate and confidence interval for a steady-state mean.
#[derive(Debug, Clone, PartialEq)]
pub struct SteadyStateEstimate {
    pub mean: f64,
    pub half_width: f64,
    pub ci: (f64, f64),
    pub confidence_level: f64,
    pub num_batches: usize,
}

/// Compute a batch-means confidence interval over a time-ordered
/// `(timestamp, value)` series.
///
/// Samples with `timestamp < warmup` are discarded. Fails if fewer samples
/// than `num_batches` remain. With `num_batches` not dividing the sample
/// count evenly, the trailing remainder is left out (every batch has the same
/// size, `n / num_batches`).
pub fn batch_means_ci(
    series: &[(SimTime, f64)],
    warmup: SimTime,
    num_batches: usize,
    confidence_level: f64,
) -> Result<SteadyStateEstimate, AnalysisError> {
    if num_batches < 2 {
        return Err(AnalysisError::TooFewBatches(num_batches));
    }
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(AnalysisError::InvalidConfidence(confidence_level));
    }

    let steady: Vec<f64> = series
        .iter()
        .filter(|(time, _)| *time >= warmup)
        .map(|(_, value)| *value)
        .collect();

    let n = steady.len();
    if n < num_batches {
        return Err(AnalysisError::InsufficientSamples {
            available: n,
            requested: num_batches,
        });
    }

    let batch_size = n / num_batches;
    let batch_means: Vec<f64> = (0..num_batches)
        .map(|i| {
            let batch = &steady[i * batch_size..(i + 1) * batch_size];
            batch.iter().sum::<f64>() / batch_size as f64
        })
        .collect();

    let k = num_batches as f64;
    let grand_mean = batch_means.iter().sum::<f64>() / k;
    let sample_variance = batch_means
        .iter()
        .map(|m| (m - grand_mean).powi(2))
        .sum::<f64>()
        / (k - 1.0);

    let degrees_of_freedom = k - 1.0;
    let t_dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)
        .expect("degrees of freedom >= 1 by construction");
    let t_critical = t_dist.inverse_cdf((1.0 + confidence_level) / 2.0);

    let half_width = t_critical * (sample_variance / k).sqrt();

    Ok(SteadyStateEstimate {
        mean: grand_mean,
        half_width,
        ci: (grand_mean - half_width, grand_mean + half_width),
        confidence_level,
        num_batches,
    })
}
