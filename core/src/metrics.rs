//! Metrics aggregation and percentile calculation

use crate::request::Operation;
use crate::workflow::WorkflowOutcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregated metrics of one run against one target
///
/// Built once from the joined outcome sequence. Every attempted workflow
/// contributes one latency sample: its total time on success, the sentinel
/// (the workflow budget) otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Target label
    pub label: String,
    /// Workflows attempted, expected rejections excluded
    pub total: usize,
    /// Workflows that reached `completed`
    pub successes: usize,
    /// Workflows that failed
    pub failures: usize,
    /// Expected rejections, kept out of every other figure
    pub rejected: usize,
    /// Wall-clock duration of the run in seconds
    pub elapsed_secs: f64,
    /// Successful workflows per second
    pub throughput: f64,
    /// Failures as a percentage of attempts
    pub error_rate: f64,
    /// Latency statistics in seconds
    pub latency: LatencyStats,
    /// Latency samples in seconds, in outcome order
    pub samples: Vec<f64>,
    /// Per-operation breakdown
    pub operations: Vec<OperationMetrics>,
}

impl MetricsSnapshot {
    /// Aggregate a joined outcome sequence
    pub fn from_outcomes(
        label: impl Into<String>,
        outcomes: &[WorkflowOutcome],
        elapsed: Duration,
        sentinel: Duration,
    ) -> Self {
        let rejected = outcomes.iter().filter(|o| o.is_rejected()).count();
        let attempts: Vec<&WorkflowOutcome> =
            outcomes.iter().filter(|o| !o.is_rejected()).collect();

        let samples: Vec<f64> = attempts
            .iter()
            .filter_map(|o| o.latency_sample(sentinel))
            .map(|d| d.as_secs_f64())
            .collect();
        let total = attempts.len();
        let successes = attempts.iter().filter(|o| o.is_success()).count();
        let failures = attempts.iter().filter(|o| o.failure().is_some()).count();

        let mut operations: Vec<OperationMetrics> = Vec::new();
        for outcome in attempts {
            let entry = match operations
                .iter_mut()
                .position(|m| m.operation == outcome.operation)
            {
                Some(idx) => &mut operations[idx],
                None => {
                    operations.push(OperationMetrics::new(outcome.operation.clone()));
                    let last = operations.len() - 1;
                    &mut operations[last]
                }
            };
            entry.record(outcome, sentinel);
        }
        for op in &mut operations {
            op.finish();
        }

        Self {
            label: label.into(),
            total,
            successes,
            failures,
            rejected,
            elapsed_secs: elapsed.as_secs_f64(),
            throughput: throughput(successes, elapsed),
            error_rate: error_rate(failures, total),
            latency: LatencyStats::from_values(&samples),
            samples,
            operations,
        }
    }

    /// Successes as a percentage of attempts
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successes as f64 / self.total as f64 * 100.0
        }
    }
}

/// Latency statistics (seconds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct LatencyStats {
    /// Mean value
    pub mean: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// 95th percentile (nearest rank)
    pub p95: f64,
}

impl LatencyStats {
    /// Calculate statistics from a slice of values; all zero when empty
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let len = sorted.len();
        Self {
            mean: sorted.iter().sum::<f64>() / len as f64,
            min: sorted[0],
            max: sorted[len - 1],
            p95: nearest_rank(&sorted, 95.0),
        }
    }
}

/// Nearest-rank percentile of sorted values
///
/// Rank is `ceil(p / 100 * n)`, clamped to `[1, n]`; returns the value at that rank.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = ((p / 100.0) * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Successes per second; zero when nothing succeeded or no time elapsed
pub fn throughput(successes: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        successes as f64 / secs
    } else {
        0.0
    }
}

/// Failures as a percentage of attempts; zero for an empty run
pub fn error_rate(failures: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        failures as f64 / total as f64 * 100.0
    }
}

/// Per-operation breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetrics {
    /// Operation
    pub operation: Operation,
    /// Workflows attempted
    pub count: usize,
    /// Workflows that reached `completed`
    pub successes: usize,
    /// Latency statistics in seconds
    pub latency: LatencyStats,
    #[serde(skip)]
    samples: Vec<f64>,
}

impl OperationMetrics {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            count: 0,
            successes: 0,
            latency: LatencyStats::default(),
            samples: Vec::new(),
        }
    }

    fn record(&mut self, outcome: &WorkflowOutcome, sentinel: Duration) {
        self.count += 1;
        if outcome.is_success() {
            self.successes += 1;
        }
        if let Some(sample) = outcome.latency_sample(sentinel) {
            self.samples.push(sample.as_secs_f64());
        }
    }

    fn finish(&mut self) {
        self.latency = LatencyStats::from_values(&self.samples);
        self.samples = Vec::new();
    }
}
