//! Per-workflow error taxonomy

use crate::request::Operation;
use crate::response::TaskStatus;
use crate::traits::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a single workflow did not complete
///
/// These never abort a run; the driver folds them into a failed
/// [`WorkflowOutcome`](super::WorkflowOutcome).
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Task creation failed
    #[error("task creation failed: {0}")]
    Create(#[source] ServiceError),

    /// Creation of an unsupported operation was refused (expected)
    #[error("operation '{operation}' rejected with status {status:?}")]
    Rejected {
        /// Operation outside the allow-list
        operation: Operation,
        /// Status returned by the remote, if any
        status: Option<u16>,
    },

    /// The remote accepted an operation outside the allow-list
    #[error("unsupported operation '{0}' was accepted")]
    UnexpectedAcceptance(Operation),

    /// Budget exhausted before the task left `pending`
    #[error("task still {} after {budget:?}", last_status.map(|s| s.as_str()).unwrap_or("unobserved"))]
    PollTimeout {
        /// Workflow budget
        budget: Duration,
        /// Last status read, if any read succeeded
        last_status: Option<TaskStatus>,
    },

    /// The remote reported the task as failed
    #[error("remote reported task as failed")]
    TaskFailed,

    /// Completion call failed and the task did not read back as completed
    #[error("task completion failed: {0}")]
    Completion(#[source] ServiceError),

    /// Abandoned on shutdown
    #[error("workflow cancelled by shutdown")]
    Cancelled,
}

impl WorkflowError {
    /// Classification recorded on the outcome
    ///
    /// Returns `None` for an expected rejection, which is not a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            WorkflowError::Create(_) => Some(FailureKind::Create),
            WorkflowError::Rejected { .. } => None,
            WorkflowError::UnexpectedAcceptance(_) => Some(FailureKind::UnexpectedAcceptance),
            WorkflowError::PollTimeout { .. } => Some(FailureKind::PollTimeout),
            WorkflowError::TaskFailed => Some(FailureKind::TaskFailed),
            WorkflowError::Completion(_) => Some(FailureKind::Completion),
            WorkflowError::Cancelled => Some(FailureKind::Cancelled),
        }
    }
}

/// Serializable failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Creation call failed
    Create,
    /// Budget exhausted while pending
    PollTimeout,
    /// Remote reported `failed`
    TaskFailed,
    /// Completion call failed
    Completion,
    /// Unsupported operation accepted by the remote
    UnexpectedAcceptance,
    /// Abandoned on shutdown
    Cancelled,
    /// The workflow task panicked
    Panicked,
}

impl FailureKind {
    /// Short name for reports
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Create => "create_error",
            FailureKind::PollTimeout => "poll_timeout",
            FailureKind::TaskFailed => "task_failed",
            FailureKind::Completion => "completion_error",
            FailureKind::UnexpectedAcceptance => "unexpected_acceptance",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Panicked => "panicked",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
