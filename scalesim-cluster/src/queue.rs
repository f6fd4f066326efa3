//! Admission stores: FIFO and strict priority.
//!
//! Both disciplines hold fully formed requests waiting for a worker. They are
//! unbounded: the simulated system has no backpressure other than request
//! timeouts, so queue growth is allowed to run away under overload.

use scalesim_core::{Priority, Request};
use std::cell::RefCell;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};
use std::rc::Rc;

/// Shared handle to the admission store. All access happens from the single
/// simulation thread, so `Rc<RefCell<_>>` is the whole synchronization story.
pub type SharedQueue = Rc<RefCell<dyn AdmissionQueue>>;

/// Interface both disciplines implement. Which request `dequeue` yields is
/// the discipline: arrival order for FIFO, highest-priority-then-arrival for
/// strict priority.
pub trait AdmissionQueue {
    fn enqueue(&mut self, request: Rc<Request>);

    fn dequeue(&mut self) -> Option<Rc<Request>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending counts per priority class, when the store tracks them.
    /// The FIFO store does not.
    fn class_lengths(&self) -> Option<BTreeMap<Priority, usize>> {
        None
    }
}

/// Arrival-order store.
#[derive(Debug, Default)]
pub struct FifoAdmission {
    items: VecDeque<Rc<Request>>,
    total_enqueued: u64,
    total_dequeued: u64,
}

impl FifoAdmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_enqueued(&self) -> u64 {
        self.total_enqueued
    }

    pub fn total_dequeued(&self) -> u64 {
        self.total_dequeued
    }
}

impl AdmissionQueue for FifoAdmission {
    fn enqueue(&mut self, request: Rc<Request>) {
        self.items.push_back(request);
        self.total_enqueued += 1;
    }

    fn dequeue(&mut self) -> Option<Rc<Request>> {
        let item = self.items.pop_front();
        if item.is_some() {
            self.total_dequeued += 1;
        }
        item
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Heap entry wrapper: `BinaryHeap` is a max-heap, so the ordering is
/// reversed to pop the lowest priority rank first, and a sequence number
/// keeps same-class requests in arrival order (the heap alone is not stable).
#[derive(Debug)]
struct PrioritizedEntry {
    request: Rc<Request>,
    sequence: u64,
}

impl PartialEq for PrioritizedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for PrioritizedEntry {}

impl PartialOrd for PrioritizedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioritizedEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .request
            .priority
            .rank()
            .cmp(&self.request.priority.rank())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Strict-priority store: any pending higher-priority request is always
/// yielded before any lower-priority one; no sharing guarantee for lower
/// classes under sustained load.
#[derive(Debug, Default)]
pub struct PriorityAdmission {
    items: BinaryHeap<PrioritizedEntry>,
    next_sequence: u64,
    pending_by_class: BTreeMap<Priority, usize>,
}

impl PriorityAdmission {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdmissionQueue for PriorityAdmission {
    fn enqueue(&mut self, request: Rc<Request>) {
        *self.pending_by_class.entry(request.priority).or_insert(0) += 1;
        self.items.push(PrioritizedEntry {
            request,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    fn dequeue(&mut self) -> Option<Rc<Request>> {
        self.items.pop().map(|entry| {
            if let Some(count) = self.pending_by_class.get_mut(&entry.request.priority) {
                *count -= 1;
            }
            entry.request
        })
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn class_lengths(&self) -> Option<BTreeMap<Priority, usize>> {
        let mut lengths = BTreeMap::new();
        for priority in Priority::ALL {
            lengths.insert(
                priority,
                self.pending_by_class.get(&priority).copied().unwrap_or(0),
            );
        }
        Some(lengths)
    }
}
