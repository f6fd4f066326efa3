//! Per-request deadline enforcement.
//!
//! Each `Deadline` event is one logical watcher: scheduled by the generator
//! at request creation, it fires exactly once at arrival + timeout and races
//! the worker that may dequeue the request in the same instant. The race is
//! settled entirely by the request's flag pair (see
//! [`scalesim_core::Request`]): whichever side runs first wins, and the other
//! observes it.

use crate::SharedMetrics;
use scalesim_core::{Component, Key, Request, Scheduler};
use std::rc::Rc;
use tracing::debug;

#[derive(Debug)]
pub enum WatchEvent {
    Deadline(Rc<Request>),
}

pub struct TimeoutWatcher {
    metrics: SharedMetrics,
}

impl TimeoutWatcher {
    pub fn new(metrics: SharedMetrics) -> Self {
        Self { metrics }
    }
}

impl Component for TimeoutWatcher {
    type Event = WatchEvent;

    fn process_event(
        &mut self,
        _self_id: Key<WatchEvent>,
        event: &WatchEvent,
        scheduler: &mut Scheduler,
    ) {
        let WatchEvent::Deadline(request) = event;
        if request.expire() {
            debug!(request = %request.id, kind = %request.kind, "request timed out in queue");
            self.metrics
                .borrow_mut()
                .record_timeout(scheduler.time(), request.kind, request.priority);
        }
    }
}
