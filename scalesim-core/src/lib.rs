//! Discrete event simulation core.
//!
//! Building blocks for deterministic single-threaded simulation: a virtual
//! clock and event scheduler, a component model for logically concurrent
//! actors, executors with different stopping conditions, seedable RNG
//! streams, and service-time distributions.
//!
//! # Architecture
//!
//! A [`Simulation`] owns a [`Scheduler`] (clock + pending-event heap) and a
//! set of [`Component`]s. Each component declares its own event enum; it is
//! resumed by the event loop one event at a time, mutates its state, and
//! schedules follow-up events. Since exactly one component runs at any
//! moment, shared state needs no locking; `Rc`/`Cell` suffice.
//!
//! Determinism rests on two rules: same-instant events pop in scheduling
//! order, and every random draw comes from an explicitly seeded stream
//! (see [`rng::RngStreams`]).
//!
//! ```no_run
//! use scalesim_core::{Executor, SimTime, Simulation};
//!
//! let mut sim = Simulation::default();
//! // add components, schedule initial events ...
//! sim.execute(Executor::timed(SimTime::from_secs(1000)));
//! ```

pub mod dists;
pub mod error;
pub mod execute;
pub mod ids;
pub mod logging;
pub mod request;
pub mod rng;
pub mod scheduler;
pub mod time;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};
use uuid::Uuid;

pub use dists::{DistributionSpec, ServiceDistribution};
pub use error::{ConfigError, SimError};
pub use execute::{Execute, Executor};
pub use logging::{init_simulation_logging, init_simulation_logging_with_level};
pub use request::{Priority, Request, RequestId, RequestType};
pub use rng::{RngStreams, SeedSequence};
pub use scheduler::{ClockRef, EventEntry, EventId, Scheduler};
pub use time::SimTime;

/// Typed handle to a registered component. `E` is the component's event type,
/// so scheduling an event of the wrong type is a compile error.
#[derive(Debug)]
pub struct Key<E> {
    id: Uuid,
    _marker: std::marker::PhantomData<E>,
}

impl<E> Key<E> {
    pub fn new_with_id(id: Uuid) -> Self {
        Self {
            id,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<E> Clone for Key<E> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<E> Copy for Key<E> {}

/// Object-safe entry point used by the registry to deliver type-erased events.
pub trait ProcessEventEntry: Any {
    fn process_event_entry(&mut self, entry: EventEntry, scheduler: &mut Scheduler);
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A simulation actor: owns state, reacts to its own event type, and talks to
/// other components only by scheduling events on their keys.
pub trait Component: ProcessEventEntry {
    type Event: 'static;

    fn process_event(
        &mut self,
        self_id: Key<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
    );
}

impl<E, C> ProcessEventEntry for C
where
    E: fmt::Debug + 'static,
    C: Component<Event = E> + 'static,
{
    fn process_event_entry(&mut self, entry: EventEntry, scheduler: &mut Scheduler) {
        let typed = entry
            .downcast::<E>()
            .expect("event payload does not match component event type");
        self.process_event(typed.component_key, typed.event, scheduler);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Type-erased component registry, keyed by deterministically derived UUIDs
/// so that registration order alone decides every key.
#[derive(Default)]
pub struct Components {
    components: HashMap<Uuid, Box<dyn ProcessEventEntry>>,
    next_key: u64,
}

impl Components {
    /// Register a component and return its typed key.
    #[must_use]
    pub fn register<E: fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        component: C,
    ) -> Key<E> {
        self.next_key += 1;
        let id = ids::deterministic_uuid(ids::UUID_DOMAIN_COMPONENT, self.next_key);
        self.components.insert(id, Box::new(component));
        Key::new_with_id(id)
    }

    /// Deliver an event entry to its target component. Entries addressed to a
    /// removed component are dropped (an abandoned actor past the horizon).
    pub fn process_event_entry(&mut self, entry: EventEntry, scheduler: &mut Scheduler) {
        if let Some(component) = self.components.get_mut(&entry.component) {
            component.process_event_entry(entry, scheduler);
        }
    }

    /// Remove a component and recover its concrete type, typically at the end
    /// of a run to inspect final state.
    pub fn remove<E: 'static, C: Component<Event = E> + 'static>(&mut self, key: Key<E>) -> Option<C> {
        self.components.remove(&key.id).and_then(|boxed| {
            let boxed_any: Box<dyn Any> = boxed;
            boxed_any.downcast::<C>().ok().map(|c| *c)
        })
    }

    /// Mutable access to a registered component.
    pub fn get_mut<E: 'static, C: Component<Event = E> + 'static>(
        &mut self,
        key: Key<E>,
    ) -> Option<&mut C> {
        self.components
            .get_mut(&key.id)
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<C>())
    }
}

/// The scheduler and the components, stepped together.
#[derive(Default)]
pub struct Simulation {
    pub(crate) scheduler: Scheduler,
    pub components: Components,
}

impl Simulation {
    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.scheduler.time()
    }

    /// A read-only clock handle for components that only need the time.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        self.scheduler.clock()
    }

    /// Process one event. Returns `false` once no events remain.
    pub fn step(&mut self) -> bool {
        match self.scheduler.pop() {
            Some(event) => {
                trace!(event_time = %event.time(), "processing simulation step");
                self.components.process_event_entry(event, &mut self.scheduler);
                true
            }
            None => false,
        }
    }

    /// Run the whole simulation; the stopping condition comes from the
    /// executor (see [`Executor`]).
    pub fn execute<X: Execute>(&mut self, executor: X) {
        debug!(initial_time = %self.time(), "starting simulation execution");
        executor.execute(self);
        debug!(final_time = %self.time(), "simulation execution completed");
    }

    /// Register a component.
    #[must_use]
    pub fn add_component<E: fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        component: C,
    ) -> Key<E> {
        let key = self.components.register(component);
        debug!(component_id = %key.id(), "added component");
        key
    }

    /// Remove a component, typically to inspect its final state.
    #[must_use]
    pub fn remove_component<E: fmt::Debug + 'static, C: Component<Event = E> + 'static>(
        &mut self,
        key: Key<E>,
    ) -> Option<C> {
        self.components.remove(key)
    }

    /// Schedule an event for `component` at `time() + delay`.
    pub fn schedule<E: fmt::Debug + 'static>(&mut self, delay: SimTime, component: Key<E>, event: E) {
        self.scheduler.schedule(delay, component, event);
    }

    /// Due time of the next pending event, if any.
    pub fn peek_next_event_time(&self) -> Option<SimTime> {
        self.scheduler.peek().map(|e| e.time())
    }
}
