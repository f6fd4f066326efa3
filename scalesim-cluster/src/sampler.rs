//! Periodic system snapshots.
//!
//! Samples the observable cluster state (replica count, queue pressure) on a
//! fixed period, starting at t = 0, and appends it to the collector. Purely
//! an observer; it never influences the simulation.

use crate::queue::{AdmissionQueue, SharedQueue};
use crate::SharedMetrics;
use scalesim_core::{Component, Key, Scheduler, SimTime};
use scalesim_stats::SystemSnapshot;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug)]
pub enum SampleEvent {
    Tick,
}

pub struct SystemSampler {
    period: Duration,
    queue: SharedQueue,
    replicas: Rc<Cell<usize>>,
    metrics: SharedMetrics,
}

impl SystemSampler {
    pub fn new(
        period: Duration,
        queue: SharedQueue,
        replicas: Rc<Cell<usize>>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            period,
            queue,
            replicas,
            metrics,
        }
    }
}

impl Component for SystemSampler {
    type Event = SampleEvent;

    fn process_event(
        &mut self,
        self_id: Key<SampleEvent>,
        event: &SampleEvent,
        scheduler: &mut Scheduler,
    ) {
        let SampleEvent::Tick = event;
        let queue = self.queue.borrow();
        self.metrics.borrow_mut().record_snapshot(SystemSnapshot {
            time: scheduler.time(),
            workers: self.replicas.get(),
            queue_len: queue.len(),
            queue_by_class: queue.class_lengths(),
        });
        drop(queue);
        scheduler.schedule(SimTime::from_duration(self.period), self_id, SampleEvent::Tick);
    }
}
