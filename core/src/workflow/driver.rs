//! Create -> poll -> complete state machine

use super::error::WorkflowError;
use super::outcome::{CompletionPath, OutcomeStatus, Timeline, WorkflowOutcome};
use crate::config::BenchConfig;
use crate::request::TaskRequest;
use crate::response::{TaskRecord, TaskStatus};
use crate::traits::{call_with_timeout, ServiceError, TaskService};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Drives single workflows against one target
///
/// Cheap to clone; the orchestrator hands a clone to every spawned workflow.
#[derive(Clone)]
pub struct WorkflowDriver {
    service: Arc<dyn TaskService>,
    request_timeout: Duration,
    budget: Duration,
    poll_interval: Duration,
}

/// Successful end of the lifecycle
struct Completion {
    path: CompletionPath,
    result: Option<String>,
}

impl WorkflowDriver {
    /// Create a driver with explicit limits
    pub fn new(
        service: Arc<dyn TaskService>,
        request_timeout: Duration,
        budget: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            request_timeout,
            budget,
            poll_interval,
        }
    }

    /// Create a driver from the run configuration
    pub fn from_config(service: Arc<dyn TaskService>, config: &BenchConfig) -> Self {
        Self::new(
            service,
            config.request_timeout,
            config.workflow_timeout,
            config.poll_interval,
        )
    }

    /// Run one workflow to its outcome
    ///
    /// Never fails: every error ends up classified on the returned outcome.
    pub async fn run(&self, request: TaskRequest) -> WorkflowOutcome {
        let mut timeline = Timeline::start();
        let deadline = timeline.started() + self.budget;

        tracing::debug!(
            task_id = %request.id,
            operation = %request.operation(),
            priority = request.priority.value(),
            "Workflow started"
        );

        match self.drive(&request, &mut timeline, deadline).await {
            Ok(completion) => {
                let outcome = timeline.into_outcome(
                    &request,
                    OutcomeStatus::Completed(completion.path),
                    completion.result,
                    None,
                );
                tracing::debug!(
                    task_id = %outcome.task_id,
                    path = ?completion.path,
                    total_ms = outcome.total_time.as_millis() as u64,
                    "Workflow completed"
                );
                outcome
            }
            Err(e @ WorkflowError::Rejected { .. }) => {
                tracing::debug!(task_id = %request.id, error = %e, "Creation rejected");
                WorkflowOutcome::from_error(&request, timeline, &e)
            }
            Err(e) => {
                tracing::warn!(task_id = %request.id, error = %e, "Workflow failed");
                WorkflowOutcome::from_error(&request, timeline, &e)
            }
        }
    }

    async fn drive(
        &self,
        request: &TaskRequest,
        timeline: &mut Timeline,
        deadline: Instant,
    ) -> Result<Completion, WorkflowError> {
        self.create(request, deadline).await?;

        let record = self.poll_until_observable(&request.id, deadline).await?;

        match record.status {
            TaskStatus::Completed => {
                timeline.mark_completed();
                Ok(Completion {
                    path: CompletionPath::AlreadyCompleted,
                    result: record.result,
                })
            }
            TaskStatus::Failed => Err(WorkflowError::TaskFailed),
            TaskStatus::Processing | TaskStatus::Pending => {
                timeline.mark_processed();
                let path = self.complete(&request.id, deadline).await?;
                timeline.mark_completed();
                Ok(Completion {
                    path,
                    result: record.result,
                })
            }
        }
    }

    async fn create(&self, request: &TaskRequest, deadline: Instant) -> Result<(), WorkflowError> {
        let operation = request.operation();
        let timeout = self.call_timeout(deadline).ok_or(WorkflowError::PollTimeout {
            budget: self.budget,
            last_status: None,
        })?;

        match call_with_timeout(timeout, self.service.create_task(request)).await {
            Ok(_) if !operation.is_supported() => {
                Err(WorkflowError::UnexpectedAcceptance(operation.clone()))
            }
            Ok(_) => Ok(()),
            Err(e) if !operation.is_supported() && e.is_rejection() => {
                Err(WorkflowError::Rejected {
                    operation: operation.clone(),
                    status: e.status(),
                })
            }
            Err(e) => Err(WorkflowError::Create(e)),
        }
    }

    /// Poll until the task is processed with a result, completed, or failed
    ///
    /// Transient read errors keep the loop going; only the budget ends it.
    async fn poll_until_observable(
        &self,
        id: &str,
        deadline: Instant,
    ) -> Result<TaskRecord, WorkflowError> {
        let mut last_status = None;

        loop {
            let Some(timeout) = self.call_timeout(deadline) else {
                return Err(WorkflowError::PollTimeout {
                    budget: self.budget,
                    last_status,
                });
            };

            match call_with_timeout(timeout, self.service.get_task(id)).await {
                Ok(record) => {
                    last_status = Some(record.status);
                    if record.status.is_terminal() || record.awaits_completion() {
                        return Ok(record);
                    }
                }
                Err(e) => {
                    tracing::debug!(task_id = id, error = %e, "Poll failed, retrying");
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(WorkflowError::PollTimeout {
                    budget: self.budget,
                    last_status,
                });
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    async fn complete(&self, id: &str, deadline: Instant) -> Result<CompletionPath, WorkflowError> {
        let timeout = self
            .call_timeout(deadline)
            .ok_or(WorkflowError::Completion(ServiceError::Timeout(Duration::ZERO)))?;

        let err = match call_with_timeout(timeout, self.service.complete_task(id)).await {
            Ok(_) => return Ok(CompletionPath::Acknowledged),
            Err(e) => e,
        };

        // The remote may complete the task between our read and our call.
        if self.reads_completed(id, deadline).await {
            tracing::warn!(
                task_id = id,
                error = %err,
                "Completion call failed but task is completed; counting as success"
            );
            return Ok(CompletionPath::RaceRecovered);
        }

        Err(WorkflowError::Completion(err))
    }

    async fn reads_completed(&self, id: &str, deadline: Instant) -> bool {
        let Some(timeout) = self.call_timeout(deadline) else {
            return false;
        };
        matches!(
            call_with_timeout(timeout, self.service.get_task(id)).await,
            Ok(TaskRecord {
                status: TaskStatus::Completed,
                ..
            })
        )
    }

    /// Per-call timeout clipped to the remaining budget, `None` once exhausted
    fn call_timeout(&self, deadline: Instant) -> Option<Duration> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            None
        } else {
            Some(self.request_timeout.min(remaining))
        }
    }
}

impl std::fmt::Debug for WorkflowDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDriver")
            .field("target", &self.service.base_url())
            .field("request_timeout", &self.request_timeout)
            .field("budget", &self.budget)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
