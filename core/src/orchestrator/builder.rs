//! Builder pattern for Orchestrator construction

use std::sync::Arc;

use crate::config::BenchConfig;
use crate::error::{BenchError, BenchResult};
use crate::id::IdGenerator;
use crate::traits::TaskService;
use crate::workflow::WorkflowOutcome;

use super::executor::Orchestrator;

/// Callback invoked once per finished workflow
pub type OutcomeObserver = Arc<dyn Fn(&WorkflowOutcome) + Send + Sync>;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .concurrency(15)
///     .total_tasks(750)
///     .launch_rate(Some(50.0))
///     .service(client)
///     .ids(shared_ids.clone())
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: BenchConfig,
    service: Option<Arc<dyn TaskService>>,
    ids: Option<Arc<IdGenerator>>,
    observer: Option<OutcomeObserver>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: BenchConfig::default(),
            service: None,
            ids: None,
            observer: None,
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: BenchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency level
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the number of workflows
    pub fn total_tasks(mut self, total: usize) -> Self {
        self.config.total_tasks = total;
        self
    }

    /// Set the launch rate (workflows per second)
    pub fn launch_rate(mut self, rate: Option<f64>) -> Self {
        self.config.launch_rate = rate;
        self
    }

    /// Set the remote service
    pub fn service(mut self, service: Arc<dyn TaskService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Share an id generator, typically across the targets of one session
    pub fn ids(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Observe every finished workflow (progress reporting)
    pub fn on_outcome<F>(mut self, observer: F) -> Self
    where
        F: Fn(&WorkflowOutcome) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if no service is set or if configuration
    /// validation fails.
    pub fn build(self) -> BenchResult<Orchestrator> {
        let service = self
            .service
            .ok_or(BenchError::MissingConfig("service"))?;

        self.config.validate()?;

        let ids = self.ids.unwrap_or_default();

        Ok(Orchestrator::new(self.config, service, ids, self.observer))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
