//! Orchestrator execution logic

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::config::BenchConfig;
use crate::distribution::{DistributionAnalyzer, DistributionReport};
use crate::error::{BenchError, BenchResult};
use crate::id::IdGenerator;
use crate::limiter::{ConcurrencyLimiter, LaunchPacer, LimiterStats};
use crate::metrics::MetricsSnapshot;
use crate::plan::TaskPlan;
use crate::request::TaskRequest;
use crate::response::ServerStats;
use crate::traits::{call_with_timeout, TaskService};
use crate::workflow::{FailureKind, WorkflowDriver, WorkflowError, WorkflowOutcome};

use super::builder::OutcomeObserver;

/// Orchestrator manages runs against one target
///
/// Responsible for launching workflows, coordinating shutdown,
/// and joining outcomes.
pub struct Orchestrator {
    /// Run configuration
    pub(crate) config: BenchConfig,

    /// Remote service (shared by all workflows)
    pub(crate) service: Arc<dyn TaskService>,

    /// Id generator (possibly shared with other targets)
    pub(crate) ids: Arc<IdGenerator>,

    /// Launch pacing
    pub(crate) pacer: LaunchPacer,

    /// Shutdown signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,

    /// Progress callback
    pub(crate) observer: Option<OutcomeObserver>,
}

/// Joined result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Target label
    pub label: String,
    /// One outcome per launched workflow, in launch order
    pub outcomes: Vec<WorkflowOutcome>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
    /// Slot accounting at the end of the run
    pub limiter_stats: LimiterStats,
    /// Latency recorded for failed workflows
    pub sentinel: Duration,
    /// Spread fraction used by the distribution analysis
    pub fairness_fraction: f64,
}

impl RunResult {
    /// Aggregate latency and throughput metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_outcomes(&self.label, &self.outcomes, self.elapsed, self.sentinel)
    }

    /// Analyze the priority distribution of successful outcomes
    pub fn distribution(&self) -> DistributionReport {
        DistributionAnalyzer::new()
            .with_min_spread_fraction(self.fairness_fraction)
            .analyze(&self.outcomes)
    }

    /// Number of workflows that reached `completed`
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for a more ergonomic construction.
    pub fn new(
        config: BenchConfig,
        service: Arc<dyn TaskService>,
        ids: Arc<IdGenerator>,
        observer: Option<OutcomeObserver>,
    ) -> Self {
        let pacer = LaunchPacer::new(config.launch_rate);
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            service,
            ids,
            pacer,
            shutdown_tx,
            observer,
        }
    }

    /// Trigger shutdown of all in-flight workflows
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get the run configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Health probe against `GET /stats`
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Connectivity`] when the target cannot be reached
    /// or answers with an error; the run must not start in that case.
    pub async fn preflight(&self) -> BenchResult<ServerStats> {
        let target = self.service.base_url().to_string();
        match call_with_timeout(self.config.request_timeout, self.service.stats()).await {
            Ok(stats) => {
                tracing::info!(
                    base_url = %target,
                    workers = stats.total_workers,
                    processed = stats.total_tasks_processed,
                    "Pre-flight check passed"
                );
                Ok(stats)
            }
            Err(e) => {
                tracing::error!(base_url = %target, error = %e, "Pre-flight check failed");
                Err(BenchError::connectivity(target, e))
            }
        }
    }

    /// Run the configured batch
    ///
    /// Launches every planned workflow, waits for all of them and returns the
    /// joined outcomes. Per-workflow failures are part of the result, not errors.
    pub async fn run(&self, label: &str) -> BenchResult<RunResult> {
        let plan = TaskPlan::from_config(&self.config);
        let limiter = ConcurrencyLimiter::new(self.config.concurrency);
        let driver = WorkflowDriver::from_config(Arc::clone(&self.service), &self.config);
        let mut launch_shutdown = self.shutdown_tx.subscribe();

        tracing::info!(
            label,
            concurrency = self.config.concurrency,
            total_tasks = plan.len(),
            launch_rate = ?self.config.launch_rate,
            "Starting run"
        );

        let start = Instant::now();
        let mut requests = Vec::with_capacity(plan.len());
        let mut handles = Vec::with_capacity(plan.len());

        for spec in plan.specs() {
            // Subscribe before waiting so a shutdown during pacing reaches the workflow too
            let shutdown_rx = self.shutdown_tx.subscribe();

            let stopped = tokio::select! {
                biased;
                _ = launch_shutdown.recv() => true,
                _ = self.pacer.wait() => false,
            };
            if stopped {
                tracing::info!(
                    label,
                    launched = handles.len(),
                    skipped = plan.len() - handles.len(),
                    "Shutdown requested, no further workflows launched"
                );
                break;
            }

            let request = spec.into_request(self.ids.next(label));
            requests.push(request.clone());
            handles.push(tokio::spawn(run_guarded(
                driver.clone(),
                limiter.clone(),
                request,
                shutdown_rx,
                self.observer.clone(),
            )));
        }

        let joined = join_all(handles).await;

        let mut outcomes = Vec::with_capacity(joined.len());
        let mut panicked = 0;
        for (request, result) in requests.iter().zip(joined) {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    panicked += 1;
                    tracing::error!(task_id = %request.id, error = %e, "Workflow task panicked");
                    let outcome = WorkflowOutcome::aborted(
                        request,
                        FailureKind::Panicked,
                        e.to_string(),
                        start.elapsed(),
                    );
                    if let Some(observer) = &self.observer {
                        observer(&outcome);
                    }
                    outcomes.push(outcome);
                }
            }
        }

        if panicked > 0 && panicked == outcomes.len() {
            return Err(BenchError::orchestration(format!(
                "All {} workflow tasks panicked",
                panicked
            )));
        }

        let result = RunResult {
            label: label.to_string(),
            outcomes,
            elapsed: start.elapsed(),
            limiter_stats: limiter.stats(),
            sentinel: self.config.sentinel(),
            fairness_fraction: self.config.fairness_fraction,
        };

        if !result.limiter_stats.is_balanced() {
            tracing::warn!(
                label,
                stats = ?result.limiter_stats,
                "Concurrency slots not all released"
            );
        }

        tracing::info!(
            label,
            elapsed_secs = result.elapsed.as_secs_f64(),
            launched = result.outcomes.len(),
            succeeded = result.successes(),
            peak_in_flight = result.limiter_stats.peak,
            "Run completed"
        );

        Ok(result)
    }

    /// Run with Ctrl+C signal handling
    ///
    /// Automatically triggers graceful shutdown on Ctrl+C. In-flight workflows
    /// end as cancelled; outcomes gathered so far are still returned.
    pub async fn run_with_signal_handling(&self, label: &str) -> BenchResult<RunResult> {
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run(label).await;

        signal_handle.abort();

        result
    }
}

/// One workflow under a concurrency slot, abandoned on shutdown
///
/// The slot guard lives for the whole workflow and is dropped on every exit
/// path, including cancellation and panics.
async fn run_guarded(
    driver: WorkflowDriver,
    limiter: ConcurrencyLimiter,
    request: TaskRequest,
    mut shutdown: broadcast::Receiver<()>,
    observer: Option<OutcomeObserver>,
) -> WorkflowOutcome {
    let started = Instant::now();
    let cancelled = |request: &TaskRequest, message: String| {
        WorkflowOutcome::aborted(request, FailureKind::Cancelled, message, started.elapsed())
    };

    let outcome = tokio::select! {
        biased;

        _ = shutdown.recv() => {
            tracing::debug!(task_id = %request.id, "Workflow cancelled by shutdown");
            cancelled(&request, WorkflowError::Cancelled.to_string())
        }

        outcome = async {
            let _slot = match limiter.acquire().await {
                Ok(slot) => slot,
                Err(e) => return cancelled(&request, e.to_string()),
            };
            driver.run(request.clone()).await
        } => outcome,
    };

    if let Some(observer) = &observer {
        observer(&outcome);
    }
    outcome
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("target", &self.service.base_url())
            .field("pacer", &self.pacer)
            .finish()
    }
}
