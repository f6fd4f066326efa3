//! Service-time distributions.
//!
//! A distribution is described by a [`DistributionSpec`] (what configuration
//! files carry) and compiled into a [`ServiceDistribution`] at startup. Bad
//! parameters are a [`ConfigError`] then and there: a simulation never
//! starts with a silently substituted default.

use crate::error::ConfigError;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, LogNormal};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Declarative distribution description, as supplied by the external
/// configuration loader. A kind outside this closed set fails to deserialize,
/// so "unknown distribution" is unrepresentable past the loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "lowercase")]
pub enum DistributionSpec {
    /// Log-normal, parameterized by the *target* mean and standard deviation
    /// in seconds (converted to log-space internally).
    Lognormal { mean: f64, stdev: f64 },
    /// Exponential with the given scale (= mean) in seconds.
    Exponential { scale: f64 },
}

/// A compiled, sampleable service-time distribution.
#[derive(Debug, Clone)]
pub enum ServiceDistribution {
    LogNormal(LogNormal<f64>),
    Exponential(Exp<f64>),
}

impl ServiceDistribution {
    /// Compile a spec, validating its parameters.
    pub fn from_spec(spec: DistributionSpec) -> Result<Self, ConfigError> {
        match spec {
            DistributionSpec::Lognormal { mean, stdev } => Self::log_normal(mean, stdev),
            DistributionSpec::Exponential { scale } => Self::exponential(scale),
        }
    }

    /// Log-normal from target mean/stdev (seconds), using the standard
    /// moment-matching conversion to log-space mu/sigma.
    pub fn log_normal(mean: f64, stdev: f64) -> Result<Self, ConfigError> {
        if !(mean > 0.0) || !mean.is_finite() {
            return Err(ConfigError::NonPositiveMean { mean });
        }
        if stdev < 0.0 || !stdev.is_finite() {
            return Err(ConfigError::NegativeStdev { stdev });
        }
        let mu = (mean * mean / (stdev * stdev + mean * mean).sqrt()).ln();
        let sigma = (stdev * stdev / (mean * mean) + 1.0).ln().sqrt();
        let dist = LogNormal::new(mu, sigma).map_err(|_| ConfigError::NegativeStdev { stdev })?;
        Ok(Self::LogNormal(dist))
    }

    /// Exponential with mean `scale` seconds.
    pub fn exponential(scale: f64) -> Result<Self, ConfigError> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(ConfigError::NonPositiveScale { scale });
        }
        let dist = Exp::new(1.0 / scale).map_err(|_| ConfigError::NonPositiveScale { scale })?;
        Ok(Self::Exponential(dist))
    }

    /// Draw one service duration. Exactly one draw is consumed from `rng`.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> Duration {
        let secs = match self {
            Self::LogNormal(dist) => rng.sample(*dist),
            Self::Exponential(dist) => rng.sample(*dist),
        };
        Duration::from_secs_f64(secs)
    }
}

/// One exponential inter-arrival gap for a Poisson process with `rate`
/// events per second. Callers must ensure `rate > 0`.
pub fn exponential_gap(rng: &mut ChaCha8Rng, rate: f64) -> Duration {
    debug_assert!(rate > 0.0, "arrival rate must be positive");
    let dist = Exp::new(rate).expect("positive rate");
    Duration::from_secs_f64(dist.sample(rng))
}
