//! Side-by-side comparison of targets

use crate::TargetReport;
use serde::Serialize;

/// Values closer than this are a tie
const TIE_EPSILON: f64 = 1e-9;

/// Which target won a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// The named target had the best value
    Target(String),
    /// The best value is shared
    Tie,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Target(label) => f.write_str(label),
            Winner::Tie => f.write_str("Tie"),
        }
    }
}

/// One metric across all targets
#[derive(Debug, Clone, Serialize)]
pub struct MetricComparison {
    /// Metric name
    pub metric: &'static str,
    /// Unit for display
    pub unit: &'static str,
    /// Whether larger values are better
    pub higher_is_better: bool,
    /// `(label, value)` per target, in report order
    pub values: Vec<(String, f64)>,
    /// Winner of this metric
    pub winner: Winner,
}

/// Relative change of one target versus the baseline (first target)
#[derive(Debug, Clone, Serialize)]
pub struct Improvement {
    /// Target label
    pub label: String,
    /// Baseline label
    pub baseline: String,
    /// Throughput change in percent (positive is better)
    pub throughput_pct: Option<f64>,
    /// Average latency change in percent (positive is faster)
    pub avg_latency_pct: Option<f64>,
    /// p95 latency change in percent (positive is faster)
    pub p95_latency_pct: Option<f64>,
}

/// Comparison of two or more targets
#[derive(Debug, Clone, Serialize, Default)]
pub struct Comparison {
    /// Per-metric winners
    pub metrics: Vec<MetricComparison>,
    /// Changes versus the first target
    pub improvements: Vec<Improvement>,
}

impl Comparison {
    /// Compare reports; empty when fewer than two targets ran
    pub fn from_reports(reports: &[TargetReport]) -> Self {
        if reports.len() < 2 {
            return Self::default();
        }

        let metric = |name, unit, higher_is_better, value: fn(&TargetReport) -> f64| {
            let values: Vec<(String, f64)> = reports
                .iter()
                .map(|r| (r.label.clone(), value(r)))
                .collect();
            MetricComparison {
                metric: name,
                unit,
                higher_is_better,
                winner: winner(&values, higher_is_better),
                values,
            }
        };

        let metrics = vec![
            metric("throughput", "tasks/s", true, |r| r.metrics.throughput),
            metric("success_rate", "%", true, |r| r.metrics.success_rate()),
            metric("avg_latency", "ms", false, |r| r.metrics.latency.mean * 1000.0),
            metric("p95_latency", "ms", false, |r| r.metrics.latency.p95 * 1000.0),
            metric("error_rate", "%", false, |r| r.metrics.error_rate),
        ];

        let baseline = &reports[0];
        let improvements = reports[1..]
            .iter()
            .map(|r| Improvement {
                label: r.label.clone(),
                baseline: baseline.label.clone(),
                throughput_pct: gain(baseline.metrics.throughput, r.metrics.throughput),
                avg_latency_pct: reduction(baseline.metrics.latency.mean, r.metrics.latency.mean),
                p95_latency_pct: reduction(baseline.metrics.latency.p95, r.metrics.latency.p95),
            })
            .collect();

        Self {
            metrics,
            improvements,
        }
    }

    /// Whether there is anything to show
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

fn winner(values: &[(String, f64)], higher_is_better: bool) -> Winner {
    let better = |a: f64, b: f64| if higher_is_better { a > b } else { a < b };

    let mut best: Option<&(String, f64)> = None;
    let mut tied = false;
    for entry in values {
        match best {
            None => best = Some(entry),
            Some((_, value)) if (entry.1 - value).abs() < TIE_EPSILON => tied = true,
            Some((_, value)) if better(entry.1, *value) => {
                best = Some(entry);
                tied = false;
            }
            Some(_) => {}
        }
    }

    match best {
        Some((label, _)) if !tied => Winner::Target(label.clone()),
        _ => Winner::Tie,
    }
}

/// `(new - old) / old` in percent; `None` without a positive baseline
fn gain(old: f64, new: f64) -> Option<f64> {
    if old > 0.0 {
        Some((new - old) / old * 100.0)
    } else {
        None
    }
}

/// `(old - new) / old` in percent; `None` without a positive baseline
fn reduction(old: f64, new: f64) -> Option<f64> {
    gain(old, new).map(|pct| -pct)
}
