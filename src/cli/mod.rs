//! CLI argument parsing and the benchmark flow

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use taskbench_client::{HttpConfig, HttpTaskClient};
use taskbench_core::{
    BenchConfig, FailureKind, IdGenerator, Operation, Orchestrator, OrchestratorBuilder, Priority,
    TaskService, ValidationProbe, WorkflowDriver,
};
use taskbench_report::{console, export_all, Comparison, TargetReport};

/// Benchmark and fairness check for HTTP task-processing services
#[derive(Parser, Debug)]
#[command(name = "taskbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target as `name=url`; repeat to compare several services
    #[arg(short, long = "target", value_name = "NAME=URL")]
    pub targets: Vec<TargetArg>,

    /// Maximum number of workflows in flight
    #[arg(short = 'c', long, default_value = "10")]
    pub threads: usize,

    /// Tasks per thread (total = threads x tasks per thread)
    #[arg(long, default_value = "50")]
    pub tasks_per_thread: usize,

    /// Total number of tasks, overrides --tasks-per-thread
    #[arg(short = 'n', long)]
    pub tasks: Option<usize>,

    /// Operations cycled through the batch
    #[arg(long, value_delimiter = ',', default_value = "factorial,fibonacci,prime_check")]
    pub operations: Vec<String>,

    /// Priorities cycled through the batch
    #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
    pub priorities: Vec<u8>,

    /// Timeout of every network call, in seconds
    #[arg(long, default_value = "10")]
    pub request_timeout: u64,

    /// Overall budget of one workflow, in seconds
    #[arg(long, default_value = "30")]
    pub workflow_timeout: u64,

    /// Delay between two polls of a task, in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_interval_ms: u64,

    /// Launch at most this many workflows per second
    #[arg(long)]
    pub rate_limit: Option<f64>,

    /// Share of successful tasks a priority's positions must span
    #[arg(long, default_value = "0.5")]
    pub fairness_fraction: f64,

    /// Also check that disallowed operations are rejected
    #[arg(long)]
    pub probe_allow_list: bool,

    /// Skip CSV and JSON export
    #[arg(long)]
    pub no_export: bool,

    /// Output directory for exports
    #[arg(long, default_value = "results")]
    pub output_dir: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// `name=url` pair naming one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetArg {
    /// Label used in reports and task ids
    pub label: String,
    /// Base URL of the service
    pub url: String,
}

impl FromStr for TargetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((label, url)) if !label.trim().is_empty() && !url.trim().is_empty() => Ok(Self {
                label: label.trim().to_string(),
                url: url.trim().to_string(),
            }),
            _ => Err(format!("expected NAME=URL, got '{}'", s)),
        }
    }
}

impl Cli {
    /// Targets to benchmark, defaulting to the C++ and Rust services
    pub fn targets(&self) -> Vec<TargetArg> {
        if !self.targets.is_empty() {
            return self.targets.clone();
        }
        vec![
            TargetArg {
                label: "C++".into(),
                url: "http://localhost:5000".into(),
            },
            TargetArg {
                label: "Rust".into(),
                url: "http://localhost:7000".into(),
            },
        ]
    }

    /// Map the flags onto a validated run configuration
    pub fn bench_config(&self) -> Result<BenchConfig> {
        let priorities = self
            .priorities
            .iter()
            .map(|p| Priority::try_from(*p))
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid --priorities")?;

        let operations: Vec<Operation> = self
            .operations
            .iter()
            .map(|op| op.trim().parse().unwrap_or_else(|never| match never {}))
            .collect();

        let total = match self.tasks {
            Some(total) => total,
            None => self.threads.saturating_mul(self.tasks_per_thread),
        };

        let config = BenchConfig::new(self.threads)
            .with_total_tasks(total)
            .with_operations(operations)
            .with_priorities(priorities)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_workflow_timeout(Duration::from_secs(self.workflow_timeout))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_launch_rate(self.rate_limit)
            .with_fairness_fraction(self.fairness_fraction);

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Run the benchmark based on CLI arguments
    pub async fn run(&self) -> Result<()> {
        let config = self.bench_config()?;
        let targets = self.targets();

        tracing::info!(
            targets = targets.len(),
            concurrency = config.concurrency,
            tasks = config.total_tasks,
            "Starting taskbench"
        );

        println!("\n{}", "=".repeat(70));
        println!("   Task Service Benchmark");
        println!("{}", "=".repeat(70));
        println!();
        println!("Configuration:");
        for target in &targets {
            println!("  Target:           {} ({})", target.label, target.url);
        }
        println!("  Concurrency:      {}", config.concurrency);
        println!("  Tasks per target: {}", config.total_tasks);
        println!(
            "  Operations:       {}",
            config
                .operations
                .iter()
                .map(|op| op.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  Workflow budget:  {:?}", config.workflow_timeout);
        if let Some(rate) = config.launch_rate {
            println!("  Launch rate:      {} /s", rate);
        }
        println!("{}", "=".repeat(70));
        println!();

        let session = chrono::Utc::now().format("%H%M%S").to_string();
        let ids = Arc::new(IdGenerator::default().with_session(session));

        // Every target must answer before any workflow starts
        let mut prepared = Vec::with_capacity(targets.len());
        for target in &targets {
            let http = HttpConfig::default()
                .with_request_timeout(config.request_timeout)
                .with_pool_max_idle(config.concurrency);
            let service: Arc<dyn TaskService> = Arc::new(
                HttpTaskClient::with_config(&target.url, http)
                    .with_context(|| format!("Invalid URL for {}: {}", target.label, target.url))?,
            );
            let progress = progress_bar(config.total_tasks, &target.label);
            let orchestrator =
                build_orchestrator(&config, service.clone(), ids.clone(), &progress)?;

            let stats = orchestrator
                .preflight()
                .await
                .with_context(|| format!("Pre-flight check failed for {}", target.label))?;
            println!(
                "✓ {} reachable at {} ({} workers)",
                target.label, target.url, stats.total_workers
            );

            prepared.push((target, service, orchestrator, progress));
        }
        println!();

        let mut reports = Vec::with_capacity(prepared.len());
        for (target, service, orchestrator, progress) in prepared {
            let probe = ValidationProbe::new(
                WorkflowDriver::from_config(service, &config),
                ids.clone(),
                target.label.clone(),
            );
            let probes = probe.run(self.probe_allow_list).await;

            progress.set_draw_target(ProgressDrawTarget::stderr());
            progress.reset_elapsed();
            let result = orchestrator
                .run_with_signal_handling(&target.label)
                .await
                .with_context(|| format!("Benchmark of {} failed", target.label))?;
            progress.finish_and_clear();

            let interrupted = result
                .outcomes
                .iter()
                .any(|o| o.failure() == Some(FailureKind::Cancelled));

            reports.push(TargetReport::from_run(result, target.url.clone(), Some(probes)));

            if interrupted {
                tracing::warn!(
                    label = %target.label,
                    "Run interrupted, skipping remaining targets"
                );
                break;
            }
        }

        if reports.is_empty() {
            bail!("No target was benchmarked");
        }

        let comparison = Comparison::from_reports(&reports);
        console::print_report(&reports, &comparison);

        if !self.no_export {
            println!("\n{}", "=".repeat(70));
            println!("   Exporting Results");
            println!("{}", "=".repeat(70));

            let written = export_all(&reports, Path::new(&self.output_dir))
                .with_context(|| format!("Failed to export results to: {}", self.output_dir))?;
            for path in written {
                println!("✓ Exported to: {}", path.display());
            }
        }

        Ok(())
    }
}

fn build_orchestrator(
    config: &BenchConfig,
    service: Arc<dyn TaskService>,
    ids: Arc<IdGenerator>,
    progress: &ProgressBar,
) -> Result<Orchestrator> {
    let progress = progress.clone();
    OrchestratorBuilder::new()
        .config(config.clone())
        .service(service)
        .ids(ids)
        .on_outcome(move |outcome| {
            if !outcome.is_success() {
                progress.set_message(format!("last failure: {}", outcome.status.label()));
            }
            progress.inc(1);
        })
        .build()
        .context("Failed to build orchestrator")
}

/// Hidden until its target starts running
fn progress_bar(total: usize, label: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden());
    let style = ProgressStyle::with_template(
        "{prefix:>6} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix(label.to_string());
    pb
}
