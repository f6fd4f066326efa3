//! The request entity and its closed type/priority vocabulary.

use crate::SimTime;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// The closed set of request categories the cluster serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Login,
    Browse,
    CartAdd,
    Checkout,
    Telemetry,
}

impl RequestType {
    /// All types, in a stable order used for deterministic iteration.
    pub const ALL: [RequestType; 5] = [
        RequestType::Login,
        RequestType::Browse,
        RequestType::CartAdd,
        RequestType::Checkout,
        RequestType::Telemetry,
    ];
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestType::Login => "login",
            RequestType::Browse => "browse",
            RequestType::CartAdd => "cart_add",
            RequestType::Checkout => "checkout",
            RequestType::Telemetry => "telemetry",
        };
        f.write_str(name)
    }
}

/// Admission priority class. Lower value = higher priority, and the derived
/// `Ord` follows that: `High < Medium < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Numeric key used by the priority-ordered admission store.
    pub fn rank(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(name)
    }
}

/// Monotonically increasing request identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A single in-flight request.
///
/// The service time is crystallized: drawn once at generation and stored, so
/// that RNG consumption is independent of any queueing-induced reordering.
///
/// `serviced` and `expired` resolve the race between the worker that dequeues
/// the request and the watcher enforcing its deadline. A worker sets
/// `serviced` the instant it claims ownership; the watcher sets `expired`
/// only if `serviced` is still false at the deadline; a worker discards a
/// claimed request whose `expired` is already set. The cooperative scheduler
/// never runs two actors at once, so the pair of `Cell`s is a
/// single-writer-wins rendezvous, not a lock substitute.
#[derive(Debug)]
pub struct Request {
    pub id: RequestId,
    pub kind: RequestType,
    pub priority: Priority,
    pub arrival: SimTime,
    pub timeout: Duration,
    pub service_time: Duration,
    serviced: Cell<bool>,
    expired: Cell<bool>,
}

impl Request {
    pub fn new(
        id: RequestId,
        kind: RequestType,
        priority: Priority,
        arrival: SimTime,
        timeout: Duration,
        service_time: Duration,
    ) -> Rc<Self> {
        Rc::new(Self {
            id,
            kind,
            priority,
            arrival,
            timeout,
            service_time,
            serviced: Cell::new(false),
            expired: Cell::new(false),
        })
    }

    /// Take ownership on behalf of a worker. Returns `true` if the request is
    /// still live, `false` if it already expired and must be discarded.
    pub fn claim(&self) -> bool {
        self.serviced.set(true);
        !self.expired.get()
    }

    pub fn is_serviced(&self) -> bool {
        self.serviced.get()
    }

    /// Watcher side of the rendezvous: mark expired unless already claimed.
    /// Returns `true` if the timeout actually fired.
    pub fn expire(&self) -> bool {
        if self.serviced.get() {
            return false;
        }
        self.expired.set(true);
        true
    }

    pub fn is_expired(&self) -> bool {
        self.expired.get()
    }

    /// Absolute deadline for this request.
    pub fn deadline(&self) -> SimTime {
        self.arrival + self.timeout
    }
}
