//! Tests for the workflow driver

use super::*;
use crate::mock::{MockBehavior, MockTaskService};
use crate::request::{Operation, Priority, TaskSpec};
use crate::response::TaskStatus;
use crate::traits::TaskService;

use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helper functions
// ============================================================================

fn driver_for(service: Arc<MockTaskService>, budget: Duration) -> WorkflowDriver {
    WorkflowDriver::new(
        service as Arc<dyn TaskService>,
        Duration::from_secs(1),
        budget,
        Duration::from_millis(100),
    )
}

fn request(operation: Operation, input: u64, id: &str) -> crate::request::TaskRequest {
    TaskSpec::new(operation, input, Priority::Medium).into_request(id)
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_factorial_end_to_end() {
    let service = Arc::new(MockTaskService::normal().with_polls_until_processed(3));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver.run(request(Operation::Factorial, 5, "perf-rust-00001")).await;

    assert!(outcome.is_success());
    assert_eq!(
        outcome.status,
        OutcomeStatus::Completed(CompletionPath::Acknowledged)
    );
    assert_eq!(outcome.result.as_deref(), Some("120"));
    assert_eq!(outcome.priority, Priority::Medium);
    assert_eq!(service.completes(), 1);
    assert_eq!(service.gets(), 3);
    assert_eq!(service.status_of("perf-rust-00001"), Some(TaskStatus::Completed));

    let processing = outcome.processing_time.unwrap();
    let completion = outcome.completion_time.unwrap();
    assert_eq!(processing, Duration::from_millis(200));
    assert!(processing + completion <= outcome.total_time);
    assert!(outcome.processed_at.unwrap() <= outcome.completed_at.unwrap());
    assert!(outcome.created_at <= outcome.processed_at.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_already_completed_skips_completion_call() {
    let service = Arc::new(MockTaskService::new(MockBehavior::AutoComplete));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver.run(request(Operation::Fibonacci, 10, "t-1")).await;

    assert_eq!(
        outcome.status,
        OutcomeStatus::Completed(CompletionPath::AlreadyCompleted)
    );
    assert_eq!(outcome.result.as_deref(), Some("55"));
    assert_eq!(outcome.completion_time, Some(Duration::ZERO));
    assert_eq!(service.completes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_completion_race_counts_as_success() {
    let service = Arc::new(MockTaskService::new(MockBehavior::CompletionRace));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver.run(request(Operation::PrimeCheck, 17, "t-1")).await;

    assert_eq!(
        outcome.status,
        OutcomeStatus::Completed(CompletionPath::RaceRecovered)
    );
    assert_eq!(outcome.result.as_deref(), Some("true"));
    assert!(outcome.error.is_none());
    assert_eq!(service.completes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_completion_failure_without_completed_read() {
    let service = Arc::new(MockTaskService::new(MockBehavior::CompletionFails));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver.run(request(Operation::Factorial, 6, "t-1")).await;

    assert_eq!(outcome.failure(), Some(FailureKind::Completion));
    assert!(outcome.processing_time.is_some());
    assert!(outcome.completed_at.is_none());
    assert_eq!(service.status_of("t-1"), Some(TaskStatus::Processing));
}

// ============================================================================
// Failures and budget
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_never_processed_times_out_within_budget() {
    let service = Arc::new(MockTaskService::new(MockBehavior::NeverProcess));
    let budget = Duration::from_secs(2);
    let driver = driver_for(service.clone(), budget);

    let start = tokio::time::Instant::now();
    let outcome = driver.run(request(Operation::Factorial, 5, "t-1")).await;

    assert_eq!(outcome.failure(), Some(FailureKind::PollTimeout));
    assert!(start.elapsed() <= budget);
    assert!(outcome.total_time <= budget);
    assert_eq!(outcome.latency_sample(budget), Some(budget));
    assert!(outcome.error.unwrap().contains("pending"));
    assert_eq!(service.completes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_calls_are_bounded_by_budget() {
    let service = Arc::new(
        MockTaskService::new(MockBehavior::NeverProcess).with_delay(Duration::from_millis(700)),
    );
    let budget = Duration::from_secs(2);
    let driver = driver_for(service, budget);

    let start = tokio::time::Instant::now();
    let outcome = driver.run(request(Operation::Fibonacci, 12, "t-1")).await;

    assert!(!outcome.is_success());
    assert!(start.elapsed() <= budget);
}

#[tokio::test(start_paused = true)]
async fn test_remote_failure_is_reported() {
    let service = Arc::new(MockTaskService::new(MockBehavior::FailTasks));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver.run(request(Operation::Factorial, 5, "t-1")).await;

    assert_eq!(outcome.failure(), Some(FailureKind::TaskFailed));
    assert_eq!(service.completes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_failure() {
    let service = Arc::new(MockTaskService::new(MockBehavior::CreateFails));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver.run(request(Operation::Factorial, 5, "t-1")).await;

    assert_eq!(outcome.failure(), Some(FailureKind::Create));
    assert!(outcome.error.unwrap().contains("500"));
    assert_eq!(service.gets(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_target_fails_at_creation() {
    let service = Arc::new(MockTaskService::new(MockBehavior::Unreachable));
    let driver = driver_for(service.clone(), Duration::from_secs(1));

    let outcome = driver.run(request(Operation::Factorial, 5, "t-1")).await;

    assert_eq!(outcome.failure(), Some(FailureKind::Create));
    assert_eq!(service.gets(), 0);
}

// ============================================================================
// Allow-list
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unsupported_operation_rejected() {
    let service = Arc::new(MockTaskService::normal());
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver
        .run(request(Operation::Unsupported("square_root".into()), 16, "t-1"))
        .await;

    assert!(outcome.is_rejected());
    assert!(!outcome.is_success());
    assert_eq!(outcome.failure(), None);
    assert_eq!(service.task_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_operation_accepted_is_failure() {
    let service = Arc::new(MockTaskService::new(MockBehavior::AcceptUnsupported));
    let driver = driver_for(service.clone(), Duration::from_secs(30));

    let outcome = driver
        .run(request(Operation::Unsupported("power".into()), 2, "t-1"))
        .await;

    assert_eq!(outcome.failure(), Some(FailureKind::UnexpectedAcceptance));
    assert_eq!(service.gets(), 0);
}

#[test]
fn test_rejection_is_not_a_failure_kind() {
    let err = WorkflowError::Rejected {
        operation: Operation::Unsupported("logarithm".into()),
        status: Some(400),
    };
    assert_eq!(err.failure_kind(), None);
    assert_eq!(
        WorkflowError::TaskFailed.failure_kind(),
        Some(FailureKind::TaskFailed)
    );
}

#[test]
fn test_aborted_outcome() {
    let req = request(Operation::Factorial, 5, "t-9");
    let outcome = WorkflowOutcome::aborted(
        &req,
        FailureKind::Cancelled,
        "shutdown",
        Duration::from_millis(300),
    );

    assert_eq!(outcome.task_id, "t-9");
    assert_eq!(outcome.failure(), Some(FailureKind::Cancelled));
    assert_eq!(outcome.status.label(), "cancelled");
    assert_eq!(
        outcome.latency_sample(Duration::from_secs(30)),
        Some(Duration::from_secs(30))
    );
}
