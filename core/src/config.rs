//! Benchmark run configuration

use crate::request::{Operation, Priority};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Benchmark configuration
///
/// Defines how many workflows run, how many may be in flight at once, and
/// the time limits that guarantee every workflow terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Maximum number of workflows in flight
    pub concurrency: usize,

    /// Number of workflows per target
    pub total_tasks: usize,

    /// Operations cycled through the batch
    pub operations: Vec<Operation>,

    /// Priorities cycled through the batch
    pub priorities: Vec<Priority>,

    /// Timeout applied to every individual network call
    pub request_timeout: Duration,

    /// Overall time budget of one workflow, also the sentinel latency of failures
    pub workflow_timeout: Duration,

    /// Delay between two polls of the same task
    pub poll_interval: Duration,

    /// Optional pacing of workflow launches (workflows per second)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_rate: Option<f64>,

    /// Fraction of the successful-outcome count a priority's spread must reach
    pub fairness_fraction: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            total_tasks: 500,
            operations: Operation::SUPPORTED.to_vec(),
            priorities: Priority::ALL.to_vec(),
            request_timeout: Duration::from_secs(10),
            workflow_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            launch_rate: None,
            fairness_fraction: 0.5,
        }
    }
}

impl BenchConfig {
    /// Create a config with the given concurrency
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Default::default()
        }
    }

    /// Set the number of workflows
    pub fn with_total_tasks(mut self, total: usize) -> Self {
        self.total_tasks = total;
        self
    }

    /// Set the operations cycled through the batch
    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = operations;
        self
    }

    /// Set the priorities cycled through the batch
    pub fn with_priorities(mut self, priorities: Vec<Priority>) -> Self {
        self.priorities = priorities;
        self
    }

    /// Set the per-call timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the per-workflow budget
    pub fn with_workflow_timeout(mut self, timeout: Duration) -> Self {
        self.workflow_timeout = timeout;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the launch rate
    pub fn with_launch_rate(mut self, rate: Option<f64>) -> Self {
        self.launch_rate = rate;
        self
    }

    /// Set the fairness spread fraction
    pub fn with_fairness_fraction(mut self, fraction: f64) -> Self {
        self.fairness_fraction = fraction;
        self
    }

    /// Sentinel latency recorded for failed workflows
    pub fn sentinel(&self) -> Duration {
        self.workflow_timeout
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.total_tasks == 0 {
            return Err(ConfigError::InvalidTaskCount(
                "at least one task is required".into(),
            ));
        }

        if self.operations.is_empty() {
            return Err(ConfigError::InvalidOperations(
                "operation list is empty".into(),
            ));
        }
        if let Some(op) = self.operations.iter().find(|op| !op.is_supported()) {
            return Err(ConfigError::InvalidOperations(format!(
                "'{}' is not a supported operation; use the allow-list probe to exercise it",
                op
            )));
        }

        if self.priorities.is_empty() {
            return Err(ConfigError::InvalidPriorities(
                "priority list is empty".into(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be positive".into(),
            ));
        }
        if self.workflow_timeout < self.request_timeout {
            return Err(ConfigError::InvalidTimeout(format!(
                "workflow timeout {:?} is shorter than request timeout {:?}",
                self.workflow_timeout, self.request_timeout
            )));
        }

        if self.poll_interval.is_zero() || self.poll_interval >= self.workflow_timeout {
            return Err(ConfigError::InvalidTimeout(
                "poll interval must be positive and shorter than the workflow timeout".into(),
            ));
        }

        if let Some(rate) = self.launch_rate {
            if rate <= 0.0 {
                return Err(ConfigError::InvalidRateLimit(
                    "launch rate must be positive".into(),
                ));
            }
        }

        if !(self.fairness_fraction > 0.0 && self.fairness_fraction <= 1.0) {
            return Err(ConfigError::InvalidFairnessFraction(self.fairness_fraction));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid number of tasks
    #[error("Invalid task count: {0}")]
    InvalidTaskCount(String),

    /// Invalid operation list
    #[error("Invalid operations: {0}")]
    InvalidOperations(String),

    /// Invalid priority list
    #[error("Invalid priorities: {0}")]
    InvalidPriorities(String),

    /// Invalid timeout or interval
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Invalid launch rate
    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Fairness fraction outside (0, 1]
    #[error("Invalid fairness fraction {0}: must be in (0, 1]")]
    InvalidFairnessFraction(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchConfig::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.total_tasks, 500);
        assert_eq!(config.operations.len(), 3);
        assert_eq!(config.priorities, Priority::ALL.to_vec());
        assert_eq!(config.sentinel(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = BenchConfig::new(15)
            .with_total_tasks(30)
            .with_poll_interval(Duration::from_millis(50))
            .with_launch_rate(Some(20.0));

        assert_eq!(config.concurrency, 15);
        assert_eq!(config.total_tasks, 30);
        assert_eq!(config.launch_rate, Some(20.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_concurrency() {
        let config = BenchConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
    }

    #[test]
    fn test_config_validation_rejects_unsupported_operation() {
        let config = BenchConfig::default()
            .with_operations(vec![Operation::Unsupported("square_root".into())]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOperations(_))
        ));
    }

    #[test]
    fn test_config_validation_budget_shorter_than_call() {
        let config = BenchConfig::default()
            .with_request_timeout(Duration::from_secs(10))
            .with_workflow_timeout(Duration::from_secs(5));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
    }

    #[test]
    fn test_config_validation_fairness_fraction() {
        assert!(BenchConfig::default()
            .with_fairness_fraction(0.0)
            .validate()
            .is_err());
        assert!(BenchConfig::default()
            .with_fairness_fraction(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_config_validation_negative_rate() {
        let config = BenchConfig::default().with_launch_rate(Some(-1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = BenchConfig::new(5).with_total_tasks(40);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: BenchConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.concurrency, 5);
        assert_eq!(deserialized.total_tasks, 40);
        assert_eq!(deserialized.operations, config.operations);
    }
}
