//! taskbench-core: Workflow driver and statistics for task-service benchmarks
//!
//! This crate provides everything between the command line and the wire:
//!
//! - Protocol data structures (task requests, remote task records)
//! - The `TaskService` trait implemented by the HTTP client
//! - Id generation, concurrency limiting and launch pacing
//! - The create -> poll -> complete workflow driver
//! - Fan-out/fan-in orchestration of a run
//! - Metrics aggregation and priority distribution analysis
//! - Validation probes
//! - Configuration and error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod distribution;
pub mod error;
pub mod id;
pub mod limiter;
pub mod metrics;
pub mod orchestrator;
pub mod plan;
pub mod probe;
pub mod request;
pub mod response;
pub mod traits;
pub mod workflow;

#[cfg(test)]
pub(crate) mod mock;

pub use config::*;
pub use distribution::*;
pub use error::*;
pub use id::IdGenerator;
pub use limiter::{ConcurrencyLimiter, LaunchPacer, LimiterClosed, LimiterStats, SlotGuard};
pub use metrics::*;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OutcomeObserver, RunResult};
pub use plan::TaskPlan;
pub use probe::*;
pub use request::*;
pub use response::*;
pub use traits::*;
pub use workflow::{
    CompletionPath, FailureKind, OutcomeStatus, WorkflowDriver, WorkflowError, WorkflowOutcome,
};
