//! Simulation executors: how long to keep stepping.

use crate::{SimTime, Simulation};

/// Executes a simulation until some implementation-specific stopping
/// condition is reached.
pub trait Execute {
    fn execute(self, sim: &mut Simulation);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCondition {
    Time(SimTime),
    NoEvents,
    Steps(usize),
}

/// Standard executor covering the common stopping conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    end_condition: EndCondition,
}

impl Executor {
    /// Run until the event heap is empty.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            end_condition: EndCondition::NoEvents,
        }
    }

    /// Run events due at or before `horizon`. Events past the horizon are
    /// abandoned without side effects; the clock stops at the last event
    /// actually processed.
    #[must_use]
    pub fn timed(horizon: SimTime) -> Self {
        Self {
            end_condition: EndCondition::Time(horizon),
        }
    }

    /// Run exactly `steps` events, or fewer if the heap drains first.
    #[must_use]
    pub fn steps(steps: usize) -> Self {
        Self {
            end_condition: EndCondition::Steps(steps),
        }
    }
}

impl Execute for Executor {
    fn execute(self, sim: &mut Simulation) {
        match self.end_condition {
            EndCondition::NoEvents => while sim.step() {},
            EndCondition::Time(horizon) => {
                while sim.scheduler.peek().is_some_and(|e| e.time() <= horizon) {
                    sim.step();
                }
            }
            EndCondition::Steps(steps) => {
                for _ in 0..steps {
                    if !sim.step() {
                        break;
                    }
                }
            }
        }
    }
}
