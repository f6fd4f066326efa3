//! Event scheduler and virtual clock.
//!
//! The scheduler keeps the single authoritative simulation time and a
//! priority queue of pending events. Events scheduled for the same instant
//! pop in the order they were scheduled: every entry carries an insertion
//! sequence number that breaks time ties, which is what makes two runs with
//! identical seeds bit-identical.

use std::any::Any;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

use crate::{Key, SimTime};

/// Sequence number assigned to every scheduled event, in scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// An event waiting in the scheduler: target component, due time, and the
/// type-erased payload. Entries are handed back to [`crate::Components`],
/// which downcasts them for the owning component.
#[derive(Debug)]
pub struct EventEntry {
    event_id: EventId,
    time: SimTime,
    pub(crate) component: Uuid,
    inner: Box<dyn Any>,
}

impl EventEntry {
    fn new<E: fmt::Debug + 'static>(id: EventId, time: SimTime, component: Key<E>, event: E) -> Self {
        EventEntry {
            event_id: id,
            time,
            component: component.id(),
            inner: Box::new(event),
        }
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Downcast to an entry holding an event of type `E`, or `None`.
    #[must_use]
    pub(crate) fn downcast<E: fmt::Debug + 'static>(&self) -> Option<EventEntryTyped<'_, E>> {
        self.inner.downcast_ref::<E>().map(|event| EventEntryTyped {
            id: self.event_id,
            time: self.time,
            component_key: Key::new_with_id(self.component),
            event,
        })
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.event_id == other.event_id
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap; the sequence number
        // keeps same-instant events FIFO (BinaryHeap alone is not stable).
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.event_id.cmp(&self.event_id))
    }
}

/// A typed view of an [`EventEntry`] after downcasting.
#[derive(Debug)]
pub struct EventEntryTyped<'e, E: fmt::Debug> {
    pub id: EventId,
    pub time: SimTime,
    pub component_key: Key<E>,
    pub event: &'e E,
}

type Clock = Rc<Cell<SimTime>>;

/// Read-only handle to the simulation clock.
///
/// The clock itself is owned by the scheduler; components that only need to
/// know "what time is it" hold one of these.
#[derive(Clone)]
pub struct ClockRef {
    clock: Clock,
}

impl ClockRef {
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock.get()
    }
}

/// Owns the clock and the pending-event heap.
pub struct Scheduler {
    next_event_id: u64,
    events: BinaryHeap<EventEntry>,
    clock: Clock,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            next_event_id: 0,
            events: BinaryHeap::new(),
            clock: Rc::new(Cell::new(SimTime::zero())),
        }
    }
}

impl Scheduler {
    /// Schedule `event` for `component` at `self.time() + delay`.
    pub fn schedule<E: fmt::Debug + 'static>(&mut self, delay: SimTime, component: Key<E>, event: E) {
        self.next_event_id += 1;
        let time = self.time() + delay;
        self.events
            .push(EventEntry::new(EventId(self.next_event_id), time, component, event));
    }

    /// Schedule `event` for the current instant. It still goes through the
    /// heap, so it runs after everything already queued for this instant.
    pub fn schedule_now<E: fmt::Debug + 'static>(&mut self, component: Key<E>, event: E) {
        self.schedule(SimTime::zero(), component, event);
    }

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> SimTime {
        self.clock.get()
    }

    /// A read-only clock handle.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        ClockRef {
            clock: Rc::clone(&self.clock),
        }
    }

    /// Next scheduled event without removing it.
    pub fn peek(&self) -> Option<&EventEntry> {
        self.events.peek()
    }

    /// Remove the next event and advance the clock to its due time.
    pub fn pop(&mut self) -> Option<EventEntry> {
        self.events.pop().inspect(|event| {
            self.clock.replace(event.time());
        })
    }
}
