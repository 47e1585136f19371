//! Timed result of one workflow

use super::error::{FailureKind, WorkflowError};
use crate::request::{Operation, Priority, TaskRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a successful workflow reached `completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPath {
    /// Completion call acknowledged
    Acknowledged,
    /// The remote had already completed the task; no completion call was made
    AlreadyCompleted,
    /// Completion call failed but the task read back as completed
    RaceRecovered,
}

/// Final state of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Task reached `completed`
    Completed(CompletionPath),
    /// Creation of an unsupported operation was refused
    Rejected,
    /// Workflow failed
    Failed(FailureKind),
}

impl OutcomeStatus {
    /// Short name for reports
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Completed(_) => "completed",
            OutcomeStatus::Rejected => "rejected",
            OutcomeStatus::Failed(kind) => kind.as_str(),
        }
    }
}

/// Timed result of one create -> poll -> complete workflow
///
/// Wall-clock timestamps come from `chrono`; durations are measured on the
/// monotonic clock and are never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    /// Task id sent to the remote
    pub task_id: String,
    /// Priority label of the task
    pub priority: Priority,
    /// Requested operation
    pub operation: Operation,
    /// Calculation input
    pub input: u64,
    /// When the workflow started
    pub created_at: DateTime<Utc>,
    /// When the task was first observed processed
    pub processed_at: Option<DateTime<Utc>>,
    /// When the task was observed completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Start until processed was observed
    pub processing_time: Option<Duration>,
    /// Processed until completed was observed
    pub completion_time: Option<Duration>,
    /// Start until the workflow ended
    pub total_time: Duration,
    /// Final state
    pub status: OutcomeStatus,
    /// Calculation result reported by the remote
    pub result: Option<String>,
    /// Error description for non-successful outcomes
    pub error: Option<String>,
}

impl WorkflowOutcome {
    /// Outcome for a workflow that never produced a timeline
    ///
    /// Used for workflows cancelled on shutdown or lost to a panic.
    pub fn aborted(
        request: &TaskRequest,
        kind: FailureKind,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            task_id: request.id.clone(),
            priority: request.priority,
            operation: request.operation().clone(),
            input: request.input(),
            created_at: Utc::now()
                - chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero()),
            processed_at: None,
            completed_at: None,
            processing_time: None,
            completion_time: None,
            total_time: elapsed,
            status: OutcomeStatus::Failed(kind),
            result: None,
            error: Some(message.into()),
        }
    }

    /// Whether the task reached `completed`
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Completed(_))
    }

    /// Whether creation was refused as expected
    pub fn is_rejected(&self) -> bool {
        matches!(self.status, OutcomeStatus::Rejected)
    }

    /// Failure classification, if the workflow failed
    pub fn failure(&self) -> Option<FailureKind> {
        match self.status {
            OutcomeStatus::Failed(kind) => Some(kind),
            _ => None,
        }
    }

    /// Latency sample contributed to the metrics
    ///
    /// Successes contribute their total time and failures the sentinel.
    /// Expected rejections are not throughput attempts and contribute nothing.
    pub fn latency_sample(&self, sentinel: Duration) -> Option<Duration> {
        match self.status {
            OutcomeStatus::Completed(_) => Some(self.total_time),
            OutcomeStatus::Failed(_) => Some(sentinel),
            OutcomeStatus::Rejected => None,
        }
    }

    pub(super) fn from_error(
        request: &TaskRequest,
        timeline: Timeline,
        error: &WorkflowError,
    ) -> Self {
        let status = match error.failure_kind() {
            Some(kind) => OutcomeStatus::Failed(kind),
            None => OutcomeStatus::Rejected,
        };
        timeline.into_outcome(request, status, None, Some(error.to_string()))
    }
}

/// Timestamps collected while a workflow runs
#[derive(Debug, Clone)]
pub(super) struct Timeline {
    started: tokio::time::Instant,
    created_at: DateTime<Utc>,
    processed: Option<(tokio::time::Instant, DateTime<Utc>)>,
    completed: Option<(tokio::time::Instant, DateTime<Utc>)>,
}

impl Timeline {
    pub(super) fn start() -> Self {
        Self {
            started: tokio::time::Instant::now(),
            created_at: Utc::now(),
            processed: None,
            completed: None,
        }
    }

    pub(super) fn started(&self) -> tokio::time::Instant {
        self.started
    }

    pub(super) fn mark_processed(&mut self) {
        self.processed = Some((tokio::time::Instant::now(), Utc::now()));
    }

    /// Mark completion; a task first seen already completed is processed at the same instant
    pub(super) fn mark_completed(&mut self) {
        let now = (tokio::time::Instant::now(), Utc::now());
        self.processed.get_or_insert(now);
        self.completed = Some(now);
    }

    pub(super) fn into_outcome(
        self,
        request: &TaskRequest,
        status: OutcomeStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> WorkflowOutcome {
        let end = self
            .completed
            .map(|(at, _)| at)
            .unwrap_or_else(tokio::time::Instant::now);
        let processing_time = self
            .processed
            .map(|(at, _)| at.saturating_duration_since(self.started));
        let completion_time = match (self.processed, self.completed) {
            (Some((processed, _)), Some((completed, _))) => {
                Some(completed.saturating_duration_since(processed))
            }
            _ => None,
        };

        WorkflowOutcome {
            task_id: request.id.clone(),
            priority: request.priority,
            operation: request.operation().clone(),
            input: request.input(),
            created_at: self.created_at,
            processed_at: self.processed.map(|(_, at)| at),
            completed_at: self.completed.map(|(_, at)| at),
            processing_time,
            completion_time,
            total_time: end.saturating_duration_since(self.started),
            status,
            result,
            error,
        }
    }
}
