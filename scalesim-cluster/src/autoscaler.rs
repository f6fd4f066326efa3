//! Horizontal autoscaler control loop.
//!
//! Periodic tick: read replica count and queue pressure, compute the desired
//! replica count from the queue-length-per-worker target, clamp the per-tick
//! change and the absolute bounds, and apply it unless the direction's
//! cooldown blocks it. Cooldowns are independent per direction: a recent
//! scale-up never blocks a scale-down, and vice versa.

use crate::config::AutoscalerConfig;
use crate::pool::PoolEvent;
use crate::queue::{AdmissionQueue, SharedQueue};
use scalesim_core::{Component, Key, Scheduler, SimTime};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, trace};

#[derive(Debug)]
pub enum AutoscaleEvent {
    Tick,
}

pub struct Autoscaler {
    config: AutoscalerConfig,
    min_replicas: usize,
    max_replicas: usize,
    queue: SharedQueue,
    replicas: Rc<Cell<usize>>,
    pool: Key<PoolEvent>,
    /// `None` until the first action in that direction, so the very first
    /// decision is never cooldown-blocked.
    last_scale_up: Option<SimTime>,
    last_scale_down: Option<SimTime>,
}

impl Autoscaler {
    pub fn new(
        config: AutoscalerConfig,
        min_replicas: usize,
        max_replicas: usize,
        queue: SharedQueue,
        replicas: Rc<Cell<usize>>,
        pool: Key<PoolEvent>,
    ) -> Self {
        Self {
            config,
            min_replicas,
            max_replicas,
            queue,
            replicas,
            pool,
            last_scale_up: None,
            last_scale_down: None,
        }
    }

    /// Replica count this tick wants, before cooldown gating: the standard
    /// target-metric formula `ceil(active * avg_queue_per_worker / target)`,
    /// step-clamped against the current count and bounded to [min, max].
    fn desired_replicas(&self, active: usize, queue_len: usize) -> usize {
        let raw = if self.config.target_queue_per_worker > 0.0 && active > 0 {
            let avg_queue_per_worker = queue_len as f64 / active as f64;
            (active as f64 * avg_queue_per_worker / self.config.target_queue_per_worker).ceil()
                as usize
        } else {
            0
        };

        let step = self.config.max_step;
        raw.clamp(active.saturating_sub(step), active + step)
            .clamp(self.min_replicas, self.max_replicas)
    }

    fn cooldown_expired(last: Option<SimTime>, cooldown: Duration, now: SimTime) -> bool {
        last.is_none_or(|stamp| now >= stamp + cooldown)
    }

    fn tick(&mut self, scheduler: &mut Scheduler) {
        let now = scheduler.time();
        let active = self.replicas.get();
        let queue_len = self.queue.borrow().len();
        let desired = self.desired_replicas(active, queue_len);
        trace!(active, queue_len, desired, "autoscaler tick");

        // Only one direction is ever evaluated per cycle.
        if desired > active {
            if Self::cooldown_expired(self.last_scale_up, self.config.scale_up_cooldown, now) {
                info!(active, desired, queue_len, "scale up");
                scheduler.schedule_now(self.pool, PoolEvent::Resize(desired));
                self.last_scale_up = Some(now);
            } else {
                debug!(active, desired, "scale-up blocked by cooldown");
            }
        } else if desired < active {
            if Self::cooldown_expired(self.last_scale_down, self.config.scale_down_cooldown, now) {
                info!(active, desired, queue_len, "scale down");
                scheduler.schedule_now(self.pool, PoolEvent::Resize(desired));
                self.last_scale_down = Some(now);
            } else {
                debug!(active, desired, "scale-down blocked by cooldown");
            }
        }
    }
}

impl Component for Autoscaler {
    type Event = AutoscaleEvent;

    fn process_event(
        &mut self,
        self_id: Key<AutoscaleEvent>,
        event: &AutoscaleEvent,
        scheduler: &mut Scheduler,
    ) {
        let AutoscaleEvent::Tick = event;
        self.tick(scheduler);
        scheduler.schedule(
            SimTime::from_duration(self.config.sync_period),
            self_id,
            AutoscaleEvent::Tick,
        );
    }
}
