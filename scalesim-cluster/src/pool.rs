//! Worker pool and admission.
//!
//! The pool owns the admission store and a dynamically resized roster of
//! workers. A worker is a cooperative actor whose state lives in the roster
//! entry: idle (listed in the idle FIFO) or serving (a pending `ServiceDone`
//! event carries its epoch). Scale-down interrupts workers immediately: an
//! in-flight service is truncated and leaves no metric record (see
//! DESIGN.md).

use crate::queue::{AdmissionQueue, SharedQueue};
use crate::SharedMetrics;
use scalesim_core::{Component, Key, Request, Scheduler, SimTime};
use scalesim_stats::CompletionRecord;
use std::cell::Cell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Worker identity. Ids are a recycled resource: scale-down returns them to a
/// free list and scale-up reuses the smallest free id before minting new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Events delivered to the pool.
#[derive(Debug)]
pub enum PoolEvent {
    /// A freshly generated request from the traffic generator.
    Submit(Rc<Request>),
    /// A worker finished its crystallized service interval.
    ServiceDone {
        worker: WorkerId,
        /// Incarnation stamp; stale completions from an interrupted worker
        /// carry an old epoch and are dropped.
        epoch: u64,
        request: Rc<Request>,
        wait: Duration,
    },
    /// Autoscaler decision (also used for the initial scale-up). Applied
    /// atomically: a resize is never partially applied.
    Resize(usize),
}

#[derive(Debug)]
struct Worker {
    id: WorkerId,
    epoch: u64,
    busy: bool,
}

/// The admission subsystem: pending-request store plus worker roster.
pub struct WorkerPool {
    queue: SharedQueue,
    metrics: SharedMetrics,
    /// Roster in spawn order; scale-down removes from the tail.
    roster: Vec<Worker>,
    /// Workers with nothing to do, in the order they became idle.
    idle: VecDeque<WorkerId>,
    free_ids: BTreeSet<u32>,
    next_id: u32,
    /// Epochs are globally monotonic so a recycled worker id can never match
    /// a stale completion event.
    next_epoch: u64,
    /// Published replica count, read by the autoscaler and the sampler.
    replicas: Rc<Cell<usize>>,
}

impl WorkerPool {
    pub fn new(queue: SharedQueue, metrics: SharedMetrics, replicas: Rc<Cell<usize>>) -> Self {
        Self {
            queue,
            metrics,
            roster: Vec::new(),
            idle: VecDeque::new(),
            free_ids: BTreeSet::new(),
            next_id: 0,
            next_epoch: 0,
            replicas,
        }
    }

    pub fn active_count(&self) -> usize {
        self.roster.len()
    }

    pub fn busy_count(&self) -> usize {
        self.roster.len() - self.idle.len()
    }

    fn submit(&mut self, request: Rc<Request>, self_id: Key<PoolEvent>, scheduler: &mut Scheduler) {
        match self.idle.pop_front() {
            Some(worker) => self.run_worker(worker, Some(request), self_id, scheduler),
            None => self.queue.borrow_mut().enqueue(request),
        }
    }

    /// Drive one worker: claim `first` if given, else pull from the store;
    /// discard claimed requests that already expired (the wasted capacity
    /// cycle of the claim race); go idle when nothing is left.
    fn run_worker(
        &mut self,
        worker: WorkerId,
        first: Option<Rc<Request>>,
        self_id: Key<PoolEvent>,
        scheduler: &mut Scheduler,
    ) {
        let mut candidate = first.or_else(|| self.queue.borrow_mut().dequeue());
        loop {
            match candidate {
                Some(request) => {
                    if request.claim() {
                        self.start_service(worker, request, self_id, scheduler);
                        return;
                    }
                    debug!(%worker, request = %request.id, "discarding already-expired request");
                    candidate = self.queue.borrow_mut().dequeue();
                }
                None => {
                    let entry = self
                        .roster
                        .iter_mut()
                        .find(|w| w.id == worker)
                        .expect("running worker is on the roster");
                    entry.busy = false;
                    self.idle.push_back(worker);
                    return;
                }
            }
        }
    }

    fn start_service(
        &mut self,
        worker: WorkerId,
        request: Rc<Request>,
        self_id: Key<PoolEvent>,
        scheduler: &mut Scheduler,
    ) {
        let now = scheduler.time();
        let wait = now - request.arrival;
        let entry = self
            .roster
            .iter_mut()
            .find(|w| w.id == worker)
            .expect("serving worker is on the roster");
        entry.busy = true;
        let epoch = entry.epoch;
        debug!(
            %worker,
            request = %request.id,
            wait = ?wait,
            service = ?request.service_time,
            "service started"
        );
        let service_time = request.service_time;
        scheduler.schedule(
            SimTime::from_duration(service_time),
            self_id,
            PoolEvent::ServiceDone {
                worker,
                epoch,
                request,
                wait,
            },
        );
    }

    fn service_done(
        &mut self,
        worker: WorkerId,
        epoch: u64,
        request: &Rc<Request>,
        wait: Duration,
        self_id: Key<PoolEvent>,
        scheduler: &mut Scheduler,
    ) {
        // An interrupted worker's completion arrives with a retired epoch.
        let live = self
            .roster
            .iter()
            .any(|w| w.id == worker && w.epoch == epoch);
        if !live {
            debug!(%worker, request = %request.id, "dropping completion from interrupted worker");
            return;
        }

        let now = scheduler.time();
        let response = now - request.arrival;
        debug!(%worker, request = %request.id, response = ?response, "service completed");
        self.metrics.borrow_mut().record_completion(CompletionRecord {
            completed_at: now,
            kind: request.kind,
            priority: request.priority,
            response,
            wait,
        });

        self.run_worker(worker, None, self_id, scheduler);
    }

    /// Bring the roster to exactly `desired` workers.
    fn resize(&mut self, desired: usize, self_id: Key<PoolEvent>, scheduler: &mut Scheduler) {
        let current = self.roster.len();
        if desired > current {
            let added = desired - current;
            info!(from = current, to = desired, "scaling up");
            for _ in 0..added {
                let id = match self.free_ids.pop_first() {
                    Some(recycled) => WorkerId(recycled),
                    None => {
                        let fresh = self.next_id;
                        self.next_id += 1;
                        WorkerId(fresh)
                    }
                };
                self.next_epoch += 1;
                self.roster.push(Worker {
                    id,
                    epoch: self.next_epoch,
                    busy: false,
                });
                debug!(worker = %id, "worker started");
                // A new worker immediately looks for pending work.
                self.run_worker(id, None, self_id, scheduler);
            }
        } else if desired < current {
            let removed = current - desired;
            info!(from = current, to = desired, "scaling down");
            for victim in self.roster.split_off(desired) {
                if victim.busy {
                    debug!(worker = %victim.id, "interrupting in-flight service");
                } else {
                    self.idle.retain(|&id| id != victim.id);
                    debug!(worker = %victim.id, "stopping idle worker");
                }
                self.free_ids.insert(victim.id.0);
            }
        }
        self.replicas.set(self.roster.len());
    }
}

impl Component for WorkerPool {
    type Event = PoolEvent;

    fn process_event(
        &mut self,
        self_id: Key<PoolEvent>,
        event: &PoolEvent,
        scheduler: &mut Scheduler,
    ) {
        match event {
            PoolEvent::Submit(request) => self.submit(Rc::clone(request), self_id, scheduler),
            PoolEvent::ServiceDone {
                worker,
                epoch,
                request,
                wait,
            } => self.service_done(*worker, *epoch, request, *wait, self_id, scheduler),
            PoolEvent::Resize(desired) => self.resize(*desired, self_id, scheduler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::FifoAdmission;
    use scalesim_core::{Executor, Priority, RequestId, RequestType, Simulation};
    use scalesim_stats::MetricsCollector;
    use std::cell::RefCell;

    struct Fixture {
        sim: Simulation,
        pool: Key<PoolEvent>,
        queue: SharedQueue,
        metrics: SharedMetrics,
        replicas: Rc<Cell<usize>>,
    }

    fn fixture() -> Fixture {
        let queue: SharedQueue = Rc::new(RefCell::new(FifoAdmission::new()));
        let metrics: SharedMetrics = Rc::new(RefCell::new(MetricsCollector::new()));
        let replicas = Rc::new(Cell::new(0));
        let mut sim = Simulation::default();
        let pool = sim.add_component(WorkerPool::new(
            Rc::clone(&queue),
            Rc::clone(&metrics),
            Rc::clone(&replicas),
        ));
        Fixture {
            sim,
            pool,
            queue,
            metrics,
            replicas,
        }
    }

    fn request(id: u64, arrival_ms: u64, service_ms: u64) -> Rc<Request> {
        Request::new(
            RequestId(id),
            RequestType::Browse,
            Priority::High,
            SimTime::from_millis(arrival_ms),
            Duration::from_secs(60),
            Duration::from_millis(service_ms),
        )
    }

    #[test]
    fn single_worker_serves_in_order_and_records_times() {
        let mut f = fixture();
        f.sim.schedule(SimTime::zero(), f.pool, PoolEvent::Resize(1));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(1, 0, 100)));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(2, 0, 50)));
        f.sim.execute(Executor::unbound());

        let metrics = f.metrics.borrow();
        let completions = metrics.completions(RequestType::Browse);
        assert_eq!(completions.len(), 2);
        // First request waits 0 and completes at 100ms.
        assert_eq!(completions[0].wait, Duration::ZERO);
        assert_eq!(completions[0].response, Duration::from_millis(100));
        // Second waits for the first, completing at 150ms.
        assert_eq!(completions[1].wait, Duration::from_millis(100));
        assert_eq!(completions[1].response, Duration::from_millis(150));
        // response >= wait >= 0 always.
        for c in completions {
            assert!(c.response >= c.wait);
        }
    }

    #[test]
    fn expired_request_is_discarded_without_completion() {
        let mut f = fixture();
        let doomed = request(1, 0, 100);
        doomed.expire();
        f.sim.schedule(SimTime::zero(), f.pool, PoolEvent::Resize(1));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(Rc::clone(&doomed)));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(2, 0, 40)));
        f.sim.execute(Executor::unbound());

        let metrics = f.metrics.borrow();
        let completions = metrics.completions(RequestType::Browse);
        // Only the live request completes, and the dead claim wasted no time.
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].response, Duration::from_millis(40));
        assert!(doomed.is_serviced());
    }

    #[test]
    fn worker_ids_are_recycled_smallest_first() {
        let mut f = fixture();
        f.sim.schedule(SimTime::zero(), f.pool, PoolEvent::Resize(3));
        f.sim
            .schedule(SimTime::from_secs(1), f.pool, PoolEvent::Resize(1));
        f.sim
            .schedule(SimTime::from_secs(2), f.pool, PoolEvent::Resize(2));
        f.sim.execute(Executor::unbound());

        let pool = f
            .sim
            .components
            .get_mut::<PoolEvent, WorkerPool>(f.pool)
            .unwrap();
        // Workers 1 and 2 were removed; scale-up reuses id 1 before minting 3.
        let ids: Vec<u32> = pool.roster.iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(pool.next_id, 3);
        assert_eq!(f.replicas.get(), 2);
    }

    #[test]
    fn scale_down_truncates_in_flight_service() {
        let mut f = fixture();
        f.sim.schedule(SimTime::zero(), f.pool, PoolEvent::Resize(1));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(1, 0, 10_000)));
        // Interrupt mid-service at t = 1s.
        f.sim
            .schedule(SimTime::from_secs(1), f.pool, PoolEvent::Resize(0));
        f.sim.execute(Executor::unbound());

        // The truncated request leaves no completion record.
        assert_eq!(f.metrics.borrow().total_served(), 0);
        assert_eq!(f.replicas.get(), 0);
    }

    #[test]
    fn recycled_id_ignores_stale_completion() {
        let mut f = fixture();
        f.sim.schedule(SimTime::zero(), f.pool, PoolEvent::Resize(1));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(1, 0, 10_000)));
        // Remove the busy worker, then immediately respawn: same id 0, new
        // epoch. The old ServiceDone at t=10s must not count.
        f.sim
            .schedule(SimTime::from_secs(1), f.pool, PoolEvent::Resize(0));
        f.sim
            .schedule(SimTime::from_secs(1), f.pool, PoolEvent::Resize(1));
        f.sim.execute(Executor::unbound());

        assert_eq!(f.metrics.borrow().total_served(), 0);
        assert_eq!(f.replicas.get(), 1);
    }

    #[test]
    fn idle_workers_pick_up_queued_backlog_on_spawn() {
        let mut f = fixture();
        // Requests arrive with no workers: they queue.
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(1, 0, 30)));
        f.sim
            .schedule(SimTime::zero(), f.pool, PoolEvent::Submit(request(2, 0, 30)));
        assert_eq!(f.queue.borrow().len(), 0); // nothing processed yet
        f.sim
            .schedule(SimTime::from_secs(1), f.pool, PoolEvent::Resize(2));
        f.sim.execute(Executor::unbound());

        assert_eq!(f.metrics.borrow().total_served(), 2);
        assert_eq!(f.queue.borrow().len(), 0);
    }
}
