//! Tests for the Orchestrator module

use super::builder::OrchestratorBuilder;
use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::id::IdGenerator;
use crate::mock::{MockBehavior, MockTaskService};
use crate::traits::TaskService;
use crate::workflow::FailureKind;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helper functions
// ============================================================================

fn test_config(concurrency: usize, total: usize) -> BenchConfig {
    BenchConfig::new(concurrency)
        .with_total_tasks(total)
        .with_request_timeout(Duration::from_secs(1))
        .with_workflow_timeout(Duration::from_secs(5))
        .with_poll_interval(Duration::from_millis(50))
}

fn service(behavior: MockBehavior) -> Arc<MockTaskService> {
    Arc::new(MockTaskService::new(behavior).with_polls_until_processed(2))
}

// ============================================================================
// Builder Tests
// ============================================================================

#[test]
fn test_builder_missing_service() {
    let result = OrchestratorBuilder::new().config(test_config(2, 4)).build();
    assert!(matches!(result, Err(BenchError::MissingConfig("service"))));
}

#[test]
fn test_builder_invalid_config() {
    let result = OrchestratorBuilder::new()
        .config(test_config(2, 4))
        .concurrency(0)
        .service(service(MockBehavior::Normal))
        .build();

    assert!(matches!(result, Err(BenchError::Config(_))));
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_orchestrator_run_basic() {
    let mock = service(MockBehavior::Normal);
    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(5, 30))
        .service(mock.clone())
        .build()
        .expect("Failed to build orchestrator");

    let result = orchestrator.run("rust").await.expect("Run failed");

    assert_eq!(result.outcomes.len(), 30);
    assert_eq!(result.successes(), 30);
    assert_eq!(mock.creates(), 30);
    assert_eq!(mock.completes(), 30);
    assert_eq!(mock.processed_order().len(), 30);

    let ids: HashSet<_> = result.outcomes.iter().map(|o| o.task_id.as_str()).collect();
    assert_eq!(ids.len(), 30);
    assert!(result.outcomes[0].task_id.starts_with("perf-rust-"));

    let stats = result.limiter_stats;
    assert_eq!(stats.acquired, 30);
    assert!(stats.is_balanced());
    assert!(stats.peak <= 5);

    let metrics = result.metrics();
    assert_eq!(metrics.total, 30);
    assert_eq!(metrics.samples.len(), 30);
    assert_eq!(metrics.error_rate, 0.0);
    assert_eq!(result.distribution().total, 30);
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_failures_release_every_slot() {
    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(4, 12))
        .service(service(MockBehavior::NeverProcess))
        .build()
        .expect("Failed to build orchestrator");

    let result = orchestrator.run("cpp").await.expect("Run failed");

    assert_eq!(result.outcomes.len(), 12);
    assert!(result
        .outcomes
        .iter()
        .all(|o| o.failure() == Some(FailureKind::PollTimeout)));
    assert_eq!(result.limiter_stats.acquired, 12);
    assert!(result.limiter_stats.is_balanced());

    let metrics = result.metrics();
    assert_eq!(metrics.failures, 12);
    assert_eq!(metrics.latency.min, 5.0);
    assert_eq!(metrics.throughput, 0.0);
    assert_eq!(metrics.error_rate, 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_concurrency_bound() {
    let mock = Arc::new(
        MockTaskService::normal()
            .with_polls_until_processed(3)
            .with_delay(Duration::from_millis(20)),
    );
    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(3, 15))
        .service(mock)
        .build()
        .expect("Failed to build orchestrator");

    let result = orchestrator.run("rust").await.expect("Run failed");

    assert_eq!(result.successes(), 15);
    assert_eq!(result.limiter_stats.max_concurrent, 3);
    assert_eq!(result.limiter_stats.peak, 3);
    assert!(result.limiter_stats.is_balanced());
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_shutdown() {
    let orchestrator = Arc::new(
        OrchestratorBuilder::new()
            .config(test_config(5, 20))
            .service(service(MockBehavior::NeverProcess))
            .build()
            .expect("Failed to build orchestrator"),
    );

    let runner = Arc::clone(&orchestrator);
    let handle = tokio::spawn(async move { runner.run("rust").await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    orchestrator.shutdown();

    let result = handle
        .await
        .expect("Run task panicked")
        .expect("Run failed");

    assert_eq!(result.outcomes.len(), 20);
    assert!(result
        .outcomes
        .iter()
        .all(|o| o.failure() == Some(FailureKind::Cancelled)));
    assert!(result.elapsed < Duration::from_secs(5));
    assert!(result.limiter_stats.is_balanced());
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_panicked_workflows() {
    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(2, 4))
        .service(service(MockBehavior::PanicOnPoll))
        .build()
        .expect("Failed to build orchestrator");

    let result = orchestrator.run("rust").await;

    assert!(matches!(result, Err(BenchError::Orchestration(_))));
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_observer_sees_every_outcome() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(4, 9))
        .service(service(MockBehavior::Normal))
        .on_outcome(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .expect("Failed to build orchestrator");

    orchestrator.run("rust").await.expect("Run failed");

    assert_eq!(seen.load(Ordering::SeqCst), 9);
}

#[tokio::test(start_paused = true)]
async fn test_shared_ids_unique_across_targets() {
    let ids = Arc::new(IdGenerator::default().with_session("s1"));
    let mut all = HashSet::new();

    for label in ["cpp", "rust"] {
        let orchestrator = OrchestratorBuilder::new()
            .config(test_config(3, 6))
            .service(service(MockBehavior::AutoComplete))
            .ids(Arc::clone(&ids))
            .build()
            .expect("Failed to build orchestrator");

        let result = orchestrator.run(label).await.expect("Run failed");
        all.extend(result.outcomes.into_iter().map(|o| o.task_id));
    }

    assert_eq!(all.len(), 12);
    assert_eq!(ids.issued(), 12);
}

#[tokio::test]
async fn test_orchestrator_launch_rate() {
    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(5, 5))
        .launch_rate(Some(20.0))
        .service(Arc::new(MockTaskService::new(MockBehavior::AutoComplete)))
        .build()
        .expect("Failed to build orchestrator");

    let start = std::time::Instant::now();
    let result = orchestrator.run("rust").await.expect("Run failed");

    assert_eq!(result.successes(), 5);
    // Four paced launches after the first at 20/s
    assert!(start.elapsed() >= Duration::from_millis(150));
}

// ============================================================================
// Pre-flight Tests
// ============================================================================

#[tokio::test]
async fn test_preflight_ok() {
    let orchestrator = OrchestratorBuilder::new()
        .service(service(MockBehavior::Normal))
        .build()
        .expect("Failed to build orchestrator");

    let stats = orchestrator.preflight().await.expect("Pre-flight failed");
    assert_eq!(stats.total_workers, 4);
}

#[tokio::test]
async fn test_preflight_unreachable_is_fatal() {
    let mock: Arc<dyn TaskService> = service(MockBehavior::Unreachable);
    let orchestrator = OrchestratorBuilder::new()
        .service(mock)
        .build()
        .expect("Failed to build orchestrator");

    let err = orchestrator.preflight().await.unwrap_err();
    assert!(matches!(err, BenchError::Connectivity { .. }));
    assert!(err.to_string().contains("mock://tasks"));
}

#[tokio::test]
async fn test_orchestrator_debug_format() {
    let orchestrator = OrchestratorBuilder::new()
        .config(test_config(7, 10))
        .service(service(MockBehavior::Normal))
        .build()
        .expect("Failed to build orchestrator");

    let debug = format!("{:?}", orchestrator);
    assert!(debug.contains("Orchestrator"));
    assert!(debug.contains("mock://tasks"));
}
