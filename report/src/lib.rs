//! Report generation for benchmark results
//!
//! This crate turns joined run results into:
//!
//! - Console summaries (per target, per operation, distribution, probes)
//! - A multi-target comparison naming a winner per metric
//! - CSV exports (`performance_results.csv`, `outcomes.csv`)
//! - A JSON export (`results.json`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod comparison;
pub mod console;
pub mod csv_export;
pub mod json_export;

pub use comparison::{Comparison, Improvement, MetricComparison, Winner};
pub use csv_export::CsvExporter;
pub use json_export::JsonExporter;

use serde::Serialize;
use std::path::{Path, PathBuf};
use taskbench_core::{
    DistributionReport, LimiterStats, MetricsSnapshot, ProbeReport, RunResult, WorkflowOutcome,
};

/// File name of the per-target summary CSV
pub const SUMMARY_CSV: &str = "performance_results.csv";
/// File name of the per-workflow CSV
pub const OUTCOMES_CSV: &str = "outcomes.csv";
/// File name of the JSON export
pub const RESULTS_JSON: &str = "results.json";

/// Errors while writing reports
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything reported about one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// Target label
    pub label: String,
    /// Base URL of the target
    pub base_url: String,
    /// Latency and throughput metrics
    pub metrics: MetricsSnapshot,
    /// Priority distribution analysis
    pub distribution: DistributionReport,
    /// Slot accounting of the run
    pub limiter: LimiterStats,
    /// Validation probes, when run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes: Option<ProbeReport>,
    /// Per-workflow outcomes
    #[serde(skip)]
    pub outcomes: Vec<WorkflowOutcome>,
}

impl TargetReport {
    /// Build the report of one finished run
    pub fn from_run(
        run: RunResult,
        base_url: impl Into<String>,
        probes: Option<ProbeReport>,
    ) -> Self {
        Self {
            metrics: run.metrics(),
            distribution: run.distribution(),
            label: run.label,
            base_url: base_url.into(),
            limiter: run.limiter_stats,
            probes,
            outcomes: run.outcomes,
        }
    }
}

/// Write every export into `dir`, creating it if needed
///
/// Returns the paths written, in a stable order.
pub fn export_all(reports: &[TargetReport], dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir)?;

    let summary = dir.join(SUMMARY_CSV);
    CsvExporter::export_summary(reports, &summary)?;

    let outcomes = dir.join(OUTCOMES_CSV);
    CsvExporter::export_outcomes(reports, &outcomes)?;

    let json = dir.join(RESULTS_JSON);
    JsonExporter::export(reports, &Comparison::from_reports(reports), &json)?;

    tracing::info!(dir = %dir.display(), "Results exported");
    Ok(vec![summary, outcomes, json])
}
