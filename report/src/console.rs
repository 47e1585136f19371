//! Console rendering
//!
//! Each view implements `Display`, so callers decide where the text goes.

use crate::comparison::Comparison;
use crate::TargetReport;
use std::fmt;
use taskbench_core::{DistributionReport, ProbeReport, SpreadVerdict};

/// Positions listed per priority before truncating
const MAX_LISTED_POSITIONS: usize = 12;

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(70))?;
    writeln!(f, "   {}", title)?;
    writeln!(f, "{}", "=".repeat(70))
}

fn ms(secs: f64) -> f64 {
    secs * 1000.0
}

/// Per-target summary: counts, throughput, latency, per-operation breakdown
pub struct SummaryView<'a>(pub &'a TargetReport);

impl fmt::Display for SummaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let m = &report.metrics;

        banner(
            f,
            &format!("{} ({})", report.label.to_uppercase(), report.base_url),
        )?;
        writeln!(
            f,
            "  Tasks:              {} total, {} completed, {} failed",
            m.total, m.successes, m.failures
        )?;
        writeln!(f, "  Success rate:       {:.1}%", m.success_rate())?;
        writeln!(f, "  Elapsed:            {:.2} s", m.elapsed_secs)?;
        writeln!(f, "  Throughput:         {:.2} tasks/s", m.throughput)?;
        writeln!(f, "  Latency avg:        {:.2} ms", ms(m.latency.mean))?;
        writeln!(
            f,
            "  Latency min/max:    {:.2} / {:.2} ms",
            ms(m.latency.min),
            ms(m.latency.max)
        )?;
        writeln!(f, "  Latency p95:        {:.2} ms", ms(m.latency.p95))?;
        writeln!(f, "  Error rate:         {:.2}%", m.error_rate)?;
        if report.limiter.max_concurrent > 0 {
            writeln!(
                f,
                "  Peak in flight:     {} / {}",
                report.limiter.peak, report.limiter.max_concurrent
            )?;
        }

        if !m.operations.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Per operation:")?;
            for op in &m.operations {
                writeln!(
                    f,
                    "    {:<14}{:>6} tasks {:>6} ok   avg {:>9.2} ms   p95 {:>9.2} ms",
                    op.operation.as_str(),
                    op.count,
                    op.successes,
                    ms(op.latency.mean),
                    ms(op.latency.p95)
                )?;
            }
        }
        Ok(())
    }
}

/// Priority distribution table with raw positions
pub struct DistributionView<'a>(pub &'a DistributionReport);

impl fmt::Display for DistributionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "  Priority distribution ({} processed tasks, spread target >= {:.1}):",
            report.total, report.required_spread
        )?;
        if report.placements.is_empty() {
            return writeln!(f, "    no successful tasks to analyze");
        }

        writeln!(
            f,
            "    {:<12}{:>7}{:>10}{:>8}   {}",
            "Priority", "Count", "Avg pos", "Spread", "Verdict"
        )?;
        for p in &report.placements {
            let verdict = match p.verdict {
                SpreadVerdict::WellDistributed => "well distributed",
                SpreadVerdict::PossiblyClustered => "possibly clustered",
                SpreadVerdict::SmallSample => "too few to judge",
            };
            writeln!(
                f,
                "    {:<12}{:>7}{:>10.1}{:>8}   {}",
                format!("{} ({})", p.priority.value(), p.priority.label()),
                p.count,
                p.average_position,
                p.spread,
                verdict
            )?;

            let listed: Vec<String> = p
                .positions
                .iter()
                .take(MAX_LISTED_POSITIONS)
                .map(|pos| pos.to_string())
                .collect();
            let more = if p.positions.len() > MAX_LISTED_POSITIONS {
                format!(" ... (+{})", p.positions.len() - MAX_LISTED_POSITIONS)
            } else {
                String::new()
            };
            writeln!(f, "      positions: {}{}", listed.join(" "), more)?;
        }

        writeln!(
            f,
            "    Interleaving: {}",
            if report.is_interleaved() {
                "looks round-robin"
            } else {
                "possible priority bias (heuristic, check positions)"
            }
        )
    }
}

/// Validation probe results
pub struct ProbeView<'a>(pub &'a ProbeReport);

impl fmt::Display for ProbeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Validation:")?;
        for check in &self.0.checks {
            writeln!(f, "    [{}] {:<26} {}", check.verdict, check.name, check.detail)?;
        }
        Ok(())
    }
}

/// Multi-target comparison table
pub struct ComparisonView<'a>(pub &'a Comparison);

impl fmt::Display for ComparisonView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let comparison = self.0;
        if comparison.is_empty() {
            return Ok(());
        }

        banner(f, "Comparison")?;
        write!(f, "  {:<16}", "Metric")?;
        if let Some(first) = comparison.metrics.first() {
            for (label, _) in &first.values {
                write!(f, "{:>14}", label)?;
            }
        }
        writeln!(f, "   Winner")?;

        for metric in &comparison.metrics {
            write!(f, "  {:<16}", format!("{} ({})", metric.metric, metric.unit))?;
            for (_, value) in &metric.values {
                write!(f, "{:>14.2}", value)?;
            }
            writeln!(f, "   {}", metric.winner)?;
        }

        for imp in &comparison.improvements {
            writeln!(f)?;
            writeln!(f, "  {} vs {}:", imp.label, imp.baseline)?;
            writeln!(f, "    Throughput:   {}", signed_pct(imp.throughput_pct))?;
            writeln!(f, "    Avg latency:  {} faster", signed_pct(imp.avg_latency_pct))?;
            writeln!(f, "    P95 latency:  {} faster", signed_pct(imp.p95_latency_pct))?;
        }
        Ok(())
    }
}

fn signed_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v),
        None => "n/a".to_string(),
    }
}

/// Full console report for every target, followed by the comparison
pub fn render(reports: &[TargetReport], comparison: &Comparison) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&SummaryView(report).to_string());
        out.push('\n');
        out.push_str(&DistributionView(&report.distribution).to_string());
        if let Some(probes) = &report.probes {
            out.push('\n');
            out.push_str(&ProbeView(probes).to_string());
        }
        out.push('\n');
    }
    out.push_str(&ComparisonView(comparison).to_string());
    out
}

/// Print [`render`] to stdout
pub fn print_report(reports: &[TargetReport], comparison: &Comparison) {
    println!("{}", render(reports, comparison));
}
