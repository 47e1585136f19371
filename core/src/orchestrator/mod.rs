//! Orchestrator for benchmark runs
//!
//! The Orchestrator coordinates one run against one target:
//! - Building the task plan and assigning ids
//! - Pacing launches and bounding concurrency via the limiter
//! - Fanning workflows out as tokio tasks and joining every outcome
//! - Managing graceful shutdown via a broadcast channel
//!
//! Outcomes are gathered once all workflows have finished; statistics are
//! computed from the joined sequence, never accumulated under a lock.
//!
//! # Example
//!
//! ```ignore
//! use taskbench_core::{BenchConfig, OrchestratorBuilder};
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .config(BenchConfig::new(10).with_total_tasks(500))
//!     .service(client)
//!     .build()?;
//!
//! orchestrator.preflight().await?;
//! let result = orchestrator.run_with_signal_handling("rust").await?;
//! println!("{:.2} tasks/s", result.metrics().throughput);
//! ```

mod builder;
mod executor;

pub use builder::{OrchestratorBuilder, OutcomeObserver};
pub use executor::{Orchestrator, RunResult};

#[cfg(test)]
mod tests;
