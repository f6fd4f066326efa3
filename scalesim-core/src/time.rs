//! Virtual simulation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// A point in virtual time, stored as nanoseconds since simulation start.
///
/// All suspension in the simulator means advancing this value; nothing ever
/// blocks on the wall clock. Arithmetic saturates so that "infinite" timeouts
/// (`Duration::MAX`) simply land past any reachable horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// Simulation start.
    pub const fn zero() -> Self {
        SimTime(0)
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis * 1_000_000)
    }

    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs * 1_000_000_000)
    }

    pub fn from_duration(duration: Duration) -> Self {
        SimTime(duration.as_nanos().min(u64::MAX as u128) as u64)
    }

    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.0)
    }

    /// Seconds as a float, the unit all rate and distribution parameters use.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1e9
    }

    /// Elapsed duration since `earlier`, zero if `earlier` is in the future.
    pub fn duration_since(&self, earlier: SimTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(
            self.0
                .saturating_add(rhs.as_nanos().min(u64::MAX as u128) as u64),
        )
    }
}

impl Add<SimTime> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl Sub<SimTime> for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Duration {
        self.duration_since(rhs)
    }
}

impl From<f64> for SimTime {
    /// Convert from seconds. Panics on negative or non-finite input, which in
    /// this crate can only come from broken configuration.
    fn from(secs: f64) -> Self {
        assert!(
            secs.is_finite() && secs >= 0.0,
            "SimTime requires a finite non-negative number of seconds, got {secs}"
        );
        SimTime((secs * 1e9) as u64)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self.as_duration();
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();
        if secs > 0 {
            write!(f, "{secs}.{millis:03}s")
        } else if millis > 0 {
            write!(f, "{millis}ms")
        } else {
            write!(f, "{}ns", duration.subsec_nanos())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation() {
        assert_eq!(SimTime::zero().as_nanos(), 0);
        assert_eq!(SimTime::from_millis(1).as_nanos(), 1_000_000);
        assert_eq!(SimTime::from_secs(1).as_nanos(), 1_000_000_000);
        assert_eq!(SimTime::from(1.5).as_nanos(), 1_500_000_000);
    }

    #[test]
    fn arithmetic() {
        let t = SimTime::from_millis(100);
        assert_eq!(t + Duration::from_millis(25), SimTime::from_millis(125));
        assert_eq!(t - SimTime::from_millis(40), Duration::from_millis(60));
        // Earlier minus later clamps to zero rather than wrapping.
        assert_eq!(
            SimTime::from_millis(40) - SimTime::from_millis(100),
            Duration::ZERO
        );
    }

    #[test]
    fn infinite_timeout_saturates() {
        let deadline = SimTime::from_secs(5) + Duration::MAX;
        assert_eq!(deadline.as_nanos(), u64::MAX);
    }

    #[test]
    #[should_panic(expected = "finite non-negative")]
    fn negative_seconds_rejected() {
        let _ = SimTime::from(-1.0);
    }
}
