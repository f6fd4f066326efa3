//! Passive metrics sink for simulation runs.
//!
//! Append-only containers keyed by request type and priority class, plus
//! periodic system snapshots. All maps are `BTreeMap` and every export walks
//! them in key order, so two identical runs produce byte-identical output.

use scalesim_core::{Priority, RequestType, SimTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// One completed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub completed_at: SimTime,
    pub kind: RequestType,
    pub priority: Priority,
    /// completion − arrival
    pub response: Duration,
    /// service start − arrival
    pub wait: Duration,
}

/// One expired request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeoutRecord {
    pub expired_at: SimTime,
    pub kind: RequestType,
    pub priority: Priority,
}

/// State of the system at a sampling tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub time: SimTime,
    pub workers: usize,
    pub queue_len: usize,
    /// Per-class pending counts, present when the admission store tracks
    /// priority classes.
    pub queue_by_class: Option<BTreeMap<Priority, usize>>,
}

/// Records every lifecycle event with timestamps; never influences the
/// simulation, only observes it. The one exception to pure passivity is that
/// the traffic profiler reads the generated/timed-out tallies back to compute
/// funnel health.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    generated_by_type: BTreeMap<RequestType, u64>,
    completions_by_type: BTreeMap<RequestType, Vec<CompletionRecord>>,
    completed_by_priority: BTreeMap<Priority, u64>,
    timeouts: Vec<TimeoutRecord>,
    timed_out_by_type: BTreeMap<RequestType, u64>,
    timed_out_by_priority: BTreeMap<Priority, u64>,
    snapshots: Vec<SystemSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- recording -------------------------------------------------------

    pub fn record_generated(&mut self, kind: RequestType) {
        *self.generated_by_type.entry(kind).or_insert(0) += 1;
    }

    pub fn record_completion(&mut self, record: CompletionRecord) {
        *self.completed_by_priority.entry(record.priority).or_insert(0) += 1;
        self.completions_by_type
            .entry(record.kind)
            .or_default()
            .push(record);
    }

    pub fn record_timeout(&mut self, expired_at: SimTime, kind: RequestType, priority: Priority) {
        *self.timed_out_by_type.entry(kind).or_insert(0) += 1;
        *self.timed_out_by_priority.entry(priority).or_insert(0) += 1;
        self.timeouts.push(TimeoutRecord {
            expired_at,
            kind,
            priority,
        });
    }

    pub fn record_snapshot(&mut self, snapshot: SystemSnapshot) {
        self.snapshots.push(snapshot);
    }

    // ---- counts ----------------------------------------------------------

    pub fn generated_count(&self, kind: RequestType) -> u64 {
        self.generated_by_type.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_generated(&self) -> u64 {
        self.generated_by_type.values().sum()
    }

    pub fn served_count(&self, kind: RequestType) -> u64 {
        self.completions_by_type
            .get(&kind)
            .map_or(0, |records| records.len() as u64)
    }

    pub fn total_served(&self) -> u64 {
        self.completions_by_type.values().map(|r| r.len() as u64).sum()
    }

    pub fn timed_out_count(&self, kind: RequestType) -> u64 {
        self.timed_out_by_type.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_timed_out(&self) -> u64 {
        self.timeouts.len() as u64
    }

    pub fn served_count_by_priority(&self, priority: Priority) -> u64 {
        self.completed_by_priority.get(&priority).copied().unwrap_or(0)
    }

    pub fn timed_out_count_by_priority(&self, priority: Priority) -> u64 {
        self.timed_out_by_priority.get(&priority).copied().unwrap_or(0)
    }

    /// Observed loss rate for a type: timed-out / generated, 0 with no data.
    pub fn loss_rate(&self, kind: RequestType) -> f64 {
        let generated = self.generated_count(kind);
        if generated == 0 {
            return 0.0;
        }
        self.timed_out_count(kind) as f64 / generated as f64
    }

    // ---- raw views -------------------------------------------------------

    pub fn completions(&self, kind: RequestType) -> &[CompletionRecord] {
        self.completions_by_type
            .get(&kind)
            .map_or(&[], Vec::as_slice)
    }

    pub fn timeout_log(&self) -> &[TimeoutRecord] {
        &self.timeouts
    }

    pub fn snapshots(&self) -> &[SystemSnapshot] {
        &self.snapshots
    }

    // ---- flattened time-ordered exports ---------------------------------

    /// Response times as a time-ordered `(timestamp, seconds)` series, for
    /// one type or across all types. This is the batch-means analyzer input.
    pub fn response_time_series(&self, kind: Option<RequestType>) -> Vec<(SimTime, f64)> {
        self.value_series(kind, |record| record.response.as_secs_f64())
    }

    /// Wait times as a time-ordered `(timestamp, seconds)` series.
    pub fn wait_time_series(&self, kind: Option<RequestType>) -> Vec<(SimTime, f64)> {
        self.value_series(kind, |record| record.wait.as_secs_f64())
    }

    fn value_series<F: Fn(&CompletionRecord) -> f64>(
        &self,
        kind: Option<RequestType>,
        value: F,
    ) -> Vec<(SimTime, f64)> {
        let mut series: Vec<(SimTime, f64)> = match kind {
            Some(kind) => self
                .completions(kind)
                .iter()
                .map(|r| (r.completed_at, value(r)))
                .collect(),
            None => self
                .completions_by_type
                .values()
                .flatten()
                .map(|r| (r.completed_at, value(r)))
                .collect(),
        };
        series.sort_by_key(|(time, _)| *time);
        series
    }

    /// Queue length over time, from the periodic snapshots.
    pub fn queue_length_series(&self) -> Vec<(SimTime, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.queue_len as f64))
            .collect()
    }

    /// Worker count over time, from the periodic snapshots.
    pub fn worker_count_series(&self) -> Vec<(SimTime, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.workers as f64))
            .collect()
    }

    /// Binary outcome stream: one entry per terminated request, 0 at its
    /// completion time if served, 1 at its expiry time if timed out,
    /// time-ordered.
    pub fn outcome_stream(&self, kind: Option<RequestType>) -> Vec<(SimTime, u8)> {
        let mut stream: Vec<(SimTime, u8)> = Vec::new();
        match kind {
            Some(kind) => {
                stream.extend(self.completions(kind).iter().map(|r| (r.completed_at, 0)));
                stream.extend(
                    self.timeouts
                        .iter()
                        .filter(|t| t.kind == kind)
                        .map(|t| (t.expired_at, 1)),
                );
            }
            None => {
                stream.extend(
                    self.completions_by_type
                        .values()
                        .flatten()
                        .map(|r| (r.completed_at, 0)),
                );
                stream.extend(self.timeouts.iter().map(|t| (t.expired_at, 1)));
            }
        }
        stream.sort_by_key(|(time, _)| *time);
        stream
    }
}
