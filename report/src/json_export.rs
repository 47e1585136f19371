//! JSON export

use crate::comparison::Comparison;
use crate::{ReportError, TargetReport};
use serde_json::{json, Value};
use std::fs::File;
use std::path::Path;

/// Writes run results as one JSON document
pub struct JsonExporter;

impl JsonExporter {
    /// Export metrics, distribution, probes and the comparison
    pub fn export(
        reports: &[TargetReport],
        comparison: &Comparison,
        path: &Path,
    ) -> Result<(), ReportError> {
        let output = Self::document(reports, comparison)?;
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, &output)?;
        Ok(())
    }

    /// Build the exported document
    pub fn document(
        reports: &[TargetReport],
        comparison: &Comparison,
    ) -> Result<Value, ReportError> {
        let targets = reports
            .iter()
            .map(|report| -> Result<Value, serde_json::Error> {
                Ok(json!({
                    "label": report.label,
                    "base_url": report.base_url,
                    "metrics": serde_json::to_value(&report.metrics)?,
                    "distribution": serde_json::to_value(&report.distribution)?,
                    "limiter": serde_json::to_value(&report.limiter)?,
                    "probes": serde_json::to_value(&report.probes)?,
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "targets": targets,
            "comparison": serde_json::to_value(comparison)?,
        }))
    }
}
