//! Scenario configuration.
//!
//! A [`SimConfig`] is the complete description of one simulation run. It is
//! plain data (serde-deserializable) supplied by an external loader; the only
//! logic here is [`SimConfig::validate`], which surfaces configuration errors
//! before the simulation starts instead of letting them default silently at
//! runtime.

use scalesim_core::{ConfigError, DistributionSpec, Priority, RequestType, SimTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which admission discipline the cluster runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueDiscipline {
    /// Single store, arrival order.
    Fifo,
    /// Priority-ordered store, FIFO within a class.
    StrictPriority,
}

/// Offered load as a function of virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalProfile {
    /// Fixed rate, requests per second.
    Constant { rate: f64 },
    /// Daily-cycle style load: `base + amplitude * sin(2π t / period)`.
    Sinusoidal {
        base: f64,
        amplitude: f64,
        period: Duration,
    },
    /// Fixed rate that switches off after `active_for`, letting the system
    /// drain for the rest of the horizon.
    Pulse { rate: f64, active_for: Duration },
}

impl ArrivalProfile {
    /// Arrival rate (requests/second) at virtual time `t`. May be ≤ 0, in
    /// which case the generator idles and re-probes.
    pub fn rate_at(&self, t: SimTime) -> f64 {
        match *self {
            ArrivalProfile::Constant { rate } => rate,
            ArrivalProfile::Sinusoidal {
                base,
                amplitude,
                period,
            } => {
                let phase = t.as_secs_f64() / period.as_secs_f64();
                base + amplitude * (2.0 * std::f64::consts::PI * phase).sin()
            }
            ArrivalProfile::Pulse { rate, active_for } => {
                if t.as_duration() < active_for {
                    rate
                } else {
                    0.0
                }
            }
        }
    }
}

/// Autoscaler control-loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoscalerConfig {
    pub enabled: bool,
    /// How often the control loop wakes up.
    pub sync_period: Duration,
    /// Desired pending requests per worker; the scaling target metric.
    pub target_queue_per_worker: f64,
    /// Largest replica delta a single tick may apply.
    pub max_step: usize,
    pub scale_up_cooldown: Duration,
    pub scale_down_cooldown: Duration,
}

/// The three RNG stream seeds for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSeeds {
    pub arrival: u64,
    pub selection: u64,
    pub service: u64,
}

/// Full description of one simulation scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Virtual-time horizon; events past it are abandoned.
    pub horizon: Duration,
    pub initial_replicas: usize,
    pub min_replicas: usize,
    pub max_replicas: usize,
    pub discipline: QueueDiscipline,
    pub arrival: ArrivalProfile,
    /// Base traffic share per request type (normalized by the profiler).
    pub traffic_shares: BTreeMap<RequestType, f64>,
    pub service_times: BTreeMap<RequestType, DistributionSpec>,
    pub timeouts: BTreeMap<RequestType, Duration>,
    /// Fixed type → priority class mapping.
    pub priorities: BTreeMap<RequestType, Priority>,
    /// Funnel edges: dependent type → source type whose health scales it.
    pub funnel_dependencies: BTreeMap<RequestType, RequestType>,
    /// Minimum generated count for a source type before its health adjusts
    /// dependents (cold-start guard).
    pub funnel_min_samples: u64,
    pub autoscaler: AutoscalerConfig,
    /// System snapshot period.
    pub sample_period: Duration,
    pub seeds: StreamSeeds,
}

impl Default for SimConfig {
    /// A representative e-commerce workload: five request types, log-normal
    /// service times (exponential for telemetry), an overloaded 70 req/s
    /// offered load against 1..=8 workers.
    fn default() -> Self {
        use RequestType::*;
        Self {
            horizon: Duration::from_secs(1000),
            initial_replicas: 2,
            min_replicas: 1,
            max_replicas: 8,
            discipline: QueueDiscipline::Fifo,
            arrival: ArrivalProfile::Constant { rate: 70.0 },
            traffic_shares: BTreeMap::from([
                (Login, 0.15),
                (Browse, 0.40),
                (CartAdd, 0.15),
                (Checkout, 0.05),
                (Telemetry, 0.25),
            ]),
            service_times: BTreeMap::from([
                (Login, DistributionSpec::Lognormal { mean: 0.05, stdev: 0.02 }),
                (Browse, DistributionSpec::Lognormal { mean: 0.1, stdev: 0.08 }),
                (CartAdd, DistributionSpec::Lognormal { mean: 0.08, stdev: 0.04 }),
                (Checkout, DistributionSpec::Lognormal { mean: 0.5, stdev: 0.4 }),
                (Telemetry, DistributionSpec::Exponential { scale: 0.02 }),
            ]),
            timeouts: BTreeMap::from([
                (Login, Duration::from_secs(1)),
                (Browse, Duration::from_secs(1)),
                (CartAdd, Duration::from_secs(3)),
                (Checkout, Duration::from_secs(5)),
                (Telemetry, Duration::from_secs(5)),
            ]),
            priorities: BTreeMap::from([
                (Login, Priority::High),
                (Browse, Priority::High),
                (CartAdd, Priority::Medium),
                (Checkout, Priority::Low),
                (Telemetry, Priority::Low),
            ]),
            funnel_dependencies: BTreeMap::from([(CartAdd, Browse), (Checkout, Browse)]),
            funnel_min_samples: 50,
            autoscaler: AutoscalerConfig {
                enabled: true,
                sync_period: Duration::from_secs(7),
                target_queue_per_worker: 2.0,
                max_step: 2,
                scale_up_cooldown: Duration::from_secs(30),
                scale_down_cooldown: Duration::from_secs(150),
            },
            sample_period: Duration::from_secs(1),
            seeds: StreamSeeds {
                arrival: 0x5eed_0001,
                selection: 0x5eed_0002,
                service: 0x5eed_0003,
            },
        }
    }
}

impl SimConfig {
    /// Check the configuration before a run. Every failure here is something
    /// that would otherwise surface mid-simulation as silently wrong data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_replicas > self.max_replicas {
            return Err(ConfigError::InvertedWorkerBounds {
                min: self.min_replicas,
                max: self.max_replicas,
            });
        }
        if self.initial_replicas < self.min_replicas || self.initial_replicas > self.max_replicas {
            return Err(ConfigError::InitialOutsideBounds {
                initial: self.initial_replicas,
                min: self.min_replicas,
                max: self.max_replicas,
            });
        }
        if self.traffic_shares.is_empty() {
            return Err(ConfigError::EmptyTrafficProfile);
        }
        let total: f64 = self.traffic_shares.values().sum();
        if self.traffic_shares.values().any(|share| *share < 0.0) || total <= 0.0 {
            return Err(ConfigError::DegenerateTrafficShares);
        }
        for kind in self.traffic_shares.keys() {
            if !self.service_times.contains_key(kind) {
                return Err(ConfigError::MissingPerTypeEntry {
                    kind: kind.to_string(),
                    what: "service-time distribution",
                });
            }
            if !self.timeouts.contains_key(kind) {
                return Err(ConfigError::MissingPerTypeEntry {
                    kind: kind.to_string(),
                    what: "timeout",
                });
            }
            if !self.priorities.contains_key(kind) {
                return Err(ConfigError::MissingPerTypeEntry {
                    kind: kind.to_string(),
                    what: "priority class",
                });
            }
        }
        if self.autoscaler.enabled {
            if self.autoscaler.target_queue_per_worker <= 0.0 {
                return Err(ConfigError::NonPositiveQueueTarget {
                    target: self.autoscaler.target_queue_per_worker,
                });
            }
            if self.autoscaler.sync_period.is_zero() {
                return Err(ConfigError::ZeroSyncPeriod);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let mut config = SimConfig::default();
        config.min_replicas = 9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedWorkerBounds { .. })
        ));
    }

    #[test]
    fn missing_per_type_entries_rejected() {
        let mut config = SimConfig::default();
        config.timeouts.remove(&RequestType::Checkout);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingPerTypeEntry { what: "timeout", .. })
        ));
    }

    #[test]
    fn non_positive_target_rejected_only_when_enabled() {
        let mut config = SimConfig::default();
        config.autoscaler.target_queue_per_worker = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveQueueTarget { .. })
        ));
        config.autoscaler.enabled = false;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn degenerate_shares_rejected() {
        let mut config = SimConfig::default();
        for share in config.traffic_shares.values_mut() {
            *share = 0.0;
        }
        assert_eq!(config.validate(), Err(ConfigError::DegenerateTrafficShares));
    }

    #[test]
    fn arrival_profiles_evaluate() {
        let constant = ArrivalProfile::Constant { rate: 70.0 };
        assert_eq!(constant.rate_at(SimTime::from_secs(500)), 70.0);

        let pulse = ArrivalProfile::Pulse {
            rate: 10.0,
            active_for: Duration::from_secs(100),
        };
        assert_eq!(pulse.rate_at(SimTime::from_secs(99)), 10.0);
        assert_eq!(pulse.rate_at(SimTime::from_secs(100)), 0.0);

        let wave = ArrivalProfile::Sinusoidal {
            base: 50.0,
            amplitude: 40.0,
            period: Duration::from_secs(500),
        };
        // Peak at a quarter period.
        assert!((wave.rate_at(SimTime::from_secs(125)) - 90.0).abs() < 1e-9);
        // Trough dips below half the base.
        assert!(wave.rate_at(SimTime::from_secs(375)) < 25.0);
    }
}
