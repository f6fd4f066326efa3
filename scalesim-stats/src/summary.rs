//! End-of-run summary built from the collector.

use crate::collector::MetricsCollector;
use scalesim_core::{Priority, RequestType};
use std::fmt;

/// Per-type aggregate line.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    pub kind: RequestType,
    pub generated: u64,
    pub served: u64,
    pub timed_out: u64,
    pub mean_response_secs: Option<f64>,
    pub mean_wait_secs: Option<f64>,
    pub loss_rate: f64,
}

/// Per-priority aggregate line.
#[derive(Debug, Clone, PartialEq)]
pub struct PrioritySummary {
    pub priority: Priority,
    pub served: u64,
    pub timed_out: u64,
}

/// Human-readable recap of a finished run.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub total_generated: u64,
    pub total_served: u64,
    pub total_timed_out: u64,
    pub by_type: Vec<TypeSummary>,
    pub by_priority: Vec<PrioritySummary>,
}

impl SummaryReport {
    pub fn from_collector(metrics: &MetricsCollector) -> Self {
        let by_type = RequestType::ALL
            .iter()
            .map(|&kind| {
                let completions = metrics.completions(kind);
                let mean = |f: fn(&crate::CompletionRecord) -> f64| {
                    if completions.is_empty() {
                        None
                    } else {
                        Some(completions.iter().map(f).sum::<f64>() / completions.len() as f64)
                    }
                };
                TypeSummary {
                    kind,
                    generated: metrics.generated_count(kind),
                    served: metrics.served_count(kind),
                    timed_out: metrics.timed_out_count(kind),
                    mean_response_secs: mean(|r| r.response.as_secs_f64()),
                    mean_wait_secs: mean(|r| r.wait.as_secs_f64()),
                    loss_rate: metrics.loss_rate(kind),
                }
            })
            .collect();

        let by_priority = Priority::ALL
            .iter()
            .map(|&priority| PrioritySummary {
                priority,
                served: metrics.served_count_by_priority(priority),
                timed_out: metrics.timed_out_count_by_priority(priority),
            })
            .collect();

        Self {
            total_generated: metrics.total_generated(),
            total_served: metrics.total_served(),
            total_timed_out: metrics.total_timed_out(),
            by_type,
            by_priority,
        }
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "generated: {}", self.total_generated)?;
        writeln!(f, "served:    {}", self.total_served)?;
        writeln!(f, "timed out: {}", self.total_timed_out)?;
        writeln!(f, "-- by type --")?;
        for entry in &self.by_type {
            write!(
                f,
                "{:10} gen={:6} served={:6} lost={:6} p_loss={:6.2}%",
                entry.kind.to_string(),
                entry.generated,
                entry.served,
                entry.timed_out,
                entry.loss_rate * 100.0,
            )?;
            if let (Some(resp), Some(wait)) = (entry.mean_response_secs, entry.mean_wait_secs) {
                write!(f, " mean_resp={resp:.4}s mean_wait={wait:.4}s")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "-- by priority --")?;
        for entry in &self.by_priority {
            writeln!(
                f,
                "{:8} served={:6} lost={:6}",
                entry.priority.to_string(),
                entry.served,
                entry.timed_out,
            )?;
        }
        Ok(())
    }
}
