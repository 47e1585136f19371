//! Error types for taskbench-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::traits::ServiceError;

/// Top-level error for a benchmark run
///
/// Per-workflow failures never surface here; they are folded into
/// [`WorkflowOutcome`](crate::workflow::WorkflowOutcome)s at the workflow boundary.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote unreachable during the pre-flight probe
    #[error("{target} is not reachable: {source}")]
    Connectivity {
        /// Target label
        target: String,
        /// Underlying transport error
        #[source]
        source: ServiceError,
    },

    /// Missing builder input
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Fan-out/fan-in failure that prevents producing any outcome
    #[error("orchestration error: {0}")]
    Orchestration(String),
}

impl BenchError {
    /// Create a connectivity error for the given target
    pub fn connectivity(target: impl Into<String>, source: ServiceError) -> Self {
        Self::Connectivity {
            target: target.into(),
            source,
        }
    }

    /// Create an orchestration error
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::Orchestration(message.into())
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
