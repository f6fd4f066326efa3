//! Traffic generation.
//!
//! The generator drives arrivals: it samples the next inter-arrival gap from
//! the (possibly time-varying) offered load, and on each arrival assembles a
//! fully formed request (type drawn from the profiler's current table,
//! service time crystallized on the spot, timeout and priority resolved from
//! configuration), then spawns the request's deadline watcher and hands the
//! request to the pool.
//!
//! RNG discipline: the gap, the type choice, and the service time each come
//! from their own stream, and each decision consumes exactly one draw.

use crate::config::ArrivalProfile;
use crate::pool::PoolEvent;
use crate::profiler::TrafficProfiler;
use crate::service::ServiceTimeSampler;
use crate::watcher::WatchEvent;
use crate::SharedMetrics;
use rand::Rng;
use scalesim_core::dists::exponential_gap;
use scalesim_core::{
    Component, Key, Priority, Request, RequestId, RequestType, RngStreams, Scheduler, SimTime,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub enum GeneratorEvent {
    /// A request arrives now.
    Arrival,
    /// Re-evaluate the arrival rate without generating (the rate was ≤ 0).
    RateProbe,
}

pub struct Generator {
    profile: ArrivalProfile,
    profiler: TrafficProfiler,
    sampler: ServiceTimeSampler,
    timeouts: BTreeMap<RequestType, Duration>,
    priorities: BTreeMap<RequestType, Priority>,
    streams: RngStreams,
    next_id: u64,
    metrics: SharedMetrics,
    pool: Key<PoolEvent>,
    watcher: Key<WatchEvent>,
}

impl Generator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        profile: ArrivalProfile,
        profiler: TrafficProfiler,
        sampler: ServiceTimeSampler,
        timeouts: BTreeMap<RequestType, Duration>,
        priorities: BTreeMap<RequestType, Priority>,
        streams: RngStreams,
        metrics: SharedMetrics,
        pool: Key<PoolEvent>,
        watcher: Key<WatchEvent>,
    ) -> Self {
        Self {
            profile,
            profiler,
            sampler,
            timeouts,
            priorities,
            streams,
            next_id: 0,
            metrics,
            pool,
            watcher,
        }
    }

    /// Number of requests generated so far.
    pub fn generated(&self) -> u64 {
        self.next_id
    }

    /// Evaluate the current rate and schedule the next wake-up: an `Arrival`
    /// after one exponential gap, or a `RateProbe` one second out while the
    /// offered load is switched off. A non-positive rate consumes no draw.
    fn schedule_next(&mut self, self_id: Key<GeneratorEvent>, scheduler: &mut Scheduler) {
        let rate = self.profile.rate_at(scheduler.time());
        if rate <= 0.0 {
            scheduler.schedule(SimTime::from_secs(1), self_id, GeneratorEvent::RateProbe);
            return;
        }
        let gap = exponential_gap(&mut self.streams.arrival, rate);
        scheduler.schedule(SimTime::from_duration(gap), self_id, GeneratorEvent::Arrival);
    }

    /// One categorical draw over the profiler's current table.
    fn choose_type(&mut self) -> RequestType {
        let table = self.profiler.current_probabilities();
        let draw: f64 = self.streams.selection.gen();
        let mut cumulative = 0.0;
        for &(kind, probability) in &table {
            cumulative += probability;
            if draw < cumulative {
                return kind;
            }
        }
        // Floating-point shortfall at the tail: take the last entry.
        table.last().expect("validated profile is non-empty").0
    }

    fn emit_request(&mut self, scheduler: &mut Scheduler) {
        let now = scheduler.time();
        let kind = self.choose_type();
        let service_time = self.sampler.sample(kind, &mut self.streams.service);
        let timeout = self.timeouts[&kind];
        let priority = self.priorities[&kind];

        self.next_id += 1;
        let request = Request::new(
            RequestId(self.next_id),
            kind,
            priority,
            now,
            timeout,
            service_time,
        );
        self.metrics.borrow_mut().record_generated(kind);
        debug!(request = %request.id, %kind, %priority, service = ?service_time, "request generated");

        scheduler.schedule(
            SimTime::from_duration(timeout),
            self.watcher,
            WatchEvent::Deadline(request.clone()),
        );
        scheduler.schedule_now(self.pool, PoolEvent::Submit(request));
    }
}

impl Component for Generator {
    type Event = GeneratorEvent;

    fn process_event(
        &mut self,
        self_id: Key<GeneratorEvent>,
        event: &GeneratorEvent,
        scheduler: &mut Scheduler,
    ) {
        match event {
            GeneratorEvent::Arrival => {
                self.emit_request(scheduler);
                self.schedule_next(self_id, scheduler);
            }
            GeneratorEvent::RateProbe => self.schedule_next(self_id, scheduler),
        }
    }
}
