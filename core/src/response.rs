//! Views of remote state returned by the task-processing service

use crate::request::Priority;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status as reported by `GET /task/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, waiting for a worker
    Pending,
    /// Calculation finished, awaiting the completion call
    Processing,
    /// Completion acknowledged
    Completed,
    /// Remote processing failed
    Failed,
}

impl TaskStatus {
    /// Whether the remote has finished its side of the lifecycle
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote-observed task state
///
/// Only the remote system mutates this; the harness changes it solely
/// through the completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task id, when echoed back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Current status
    pub status: TaskStatus,
    /// Priority as stored remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Calculation result, present once processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl TaskRecord {
    /// Record with just a status
    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            id: None,
            status,
            priority: None,
            result: None,
        }
    }

    /// Attach a result
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// Processed and ready for the completion call
    pub fn awaits_completion(&self) -> bool {
        self.status == TaskStatus::Processing && self.result.is_some()
    }
}

/// Body of a successful `POST /task/create`
///
/// Creation succeeds on the status code alone; servers differ in what they
/// echo back (`task_id`, or `id` plus a message), so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAck {
    /// Id echoed by the remote
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Initial status, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

/// Body of a successful `POST /task/{id}/complete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionAck {
    /// Status after completion
    #[serde(default = "completed")]
    pub status: TaskStatus,
}

fn completed() -> TaskStatus {
    TaskStatus::Completed
}

/// Body of `GET /stats`, used only for the pre-flight probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStats {
    /// Number of remote workers
    pub total_workers: u64,
    /// Tasks processed so far
    pub total_tasks_processed: u64,
    /// Tasks completed so far
    pub total_tasks_completed: u64,
    /// Tasks failed so far
    pub total_tasks_failed: u64,
    /// Remote uptime
    pub uptime_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_record_parses_processing_with_result() {
        let record: TaskRecord = serde_json::from_str(
            r#"{"status":"processing","priority":2,"result":"120","title":"ignored"}"#,
        )
        .unwrap();

        assert_eq!(record.status, TaskStatus::Processing);
        assert_eq!(record.priority, Some(Priority::Medium));
        assert!(record.awaits_completion());
    }

    #[test]
    fn test_processing_without_result_does_not_await_completion() {
        let record = TaskRecord::with_status(TaskStatus::Processing);
        assert!(!record.awaits_completion());
    }

    #[test]
    fn test_create_ack_accepts_either_id_field() {
        let ack: CreateAck = serde_json::from_str(
            r#"{"id":"perf-rust-00001","status":"pending","message":"Task created successfully"}"#,
        )
        .unwrap();
        assert_eq!(ack.task_id.as_deref(), Some("perf-rust-00001"));
        assert_eq!(ack.status, Some(TaskStatus::Pending));

        let ack: CreateAck = serde_json::from_str(r#"{"task_id":"t-1"}"#).unwrap();
        assert_eq!(ack.task_id.as_deref(), Some("t-1"));

        let ack: CreateAck = serde_json::from_str("{}").unwrap();
        assert_eq!(ack, CreateAck::default());
    }

    #[test]
    fn test_server_stats_tolerates_missing_fields() {
        let stats: ServerStats = serde_json::from_str(r#"{"total_workers":4}"#).unwrap();
        assert_eq!(stats.total_workers, 4);
        assert_eq!(stats.total_tasks_failed, 0);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }
}
