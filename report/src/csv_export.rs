//! CSV export

use crate::{ReportError, TargetReport};
use csv::Writer;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Writes run results as CSV
pub struct CsvExporter;

impl CsvExporter {
    /// One summary row per target
    pub fn export_summary(reports: &[TargetReport], path: &Path) -> Result<(), ReportError> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record([
            "target",
            "base_url",
            "total_tasks",
            "successful_tasks",
            "failed_tasks",
            "success_rate_percent",
            "error_rate_percent",
            "elapsed_s",
            "throughput_per_s",
            "avg_latency_ms",
            "min_latency_ms",
            "max_latency_ms",
            "p95_latency_ms",
            "peak_in_flight",
            "distribution_interleaved",
        ])?;

        for report in reports {
            let m = &report.metrics;
            wtr.write_record([
                report.label.clone(),
                report.base_url.clone(),
                m.total.to_string(),
                m.successes.to_string(),
                m.failures.to_string(),
                format!("{:.2}", m.success_rate()),
                format!("{:.2}", m.error_rate),
                format!("{:.3}", m.elapsed_secs),
                format!("{:.2}", m.throughput),
                format!("{:.2}", m.latency.mean * 1000.0),
                format!("{:.2}", m.latency.min * 1000.0),
                format!("{:.2}", m.latency.max * 1000.0),
                format!("{:.2}", m.latency.p95 * 1000.0),
                report.limiter.peak.to_string(),
                report.distribution.is_interleaved().to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// One row per workflow, across every target
    pub fn export_outcomes(reports: &[TargetReport], path: &Path) -> Result<(), ReportError> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record([
            "target",
            "task_id",
            "priority",
            "operation",
            "input",
            "status",
            "created_at",
            "processed_at",
            "completed_at",
            "processing_ms",
            "completion_ms",
            "total_ms",
            "result",
            "error",
        ])?;

        for report in reports {
            for outcome in &report.outcomes {
                wtr.write_record([
                    report.label.clone(),
                    outcome.task_id.clone(),
                    outcome.priority.value().to_string(),
                    outcome.operation.to_string(),
                    outcome.input.to_string(),
                    outcome.status.label().to_string(),
                    outcome.created_at.to_rfc3339(),
                    outcome
                        .processed_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default(),
                    outcome
                        .completed_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default(),
                    millis(outcome.processing_time),
                    millis(outcome.completion_time),
                    format!("{:.3}", outcome.total_time.as_secs_f64() * 1000.0),
                    outcome.result.clone().unwrap_or_default(),
                    outcome.error.clone().unwrap_or_default(),
                ])?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}

fn millis(duration: Option<Duration>) -> String {
    duration
        .map(|d| format!("{:.3}", d.as_secs_f64() * 1000.0))
        .unwrap_or_default()
}
