//! HTTP client for the remote task-processing service
//!
//! [`HttpTaskClient`] implements [`TaskService`] over one pooled
//! `reqwest::Client` per target. It performs exactly one HTTP call per trait
//! method and never retries; polling, budgets and race tolerance belong to
//! the workflow driver in `taskbench-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use taskbench_core::{
    CompletionAck, CreateAck, ServerStats, ServiceError, TaskRecord, TaskRequest, TaskService,
};

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Configuration of the pooled HTTP client
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Request timeout
    pub request_timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// TCP keepalive interval
    pub tcp_keepalive: Option<Duration>,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            tcp_keepalive: Some(Duration::from_secs(60)),
            user_agent: format!("taskbench/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Set the request timeout; the connect timeout never exceeds it
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    /// Size the idle pool, typically to the run's concurrency
    pub fn with_pool_max_idle(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }
}

// ============================================================================
// Task Client
// ============================================================================

/// `TaskService` over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    client: Client,
    base: Url,
    base_str: String,
    config: HttpConfig,
}

impl HttpTaskClient {
    /// Create a client for `base_url` with default settings and the given request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] for a malformed base URL and
    /// [`ServiceError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ServiceError> {
        Self::with_config(
            base_url,
            HttpConfig::default().with_request_timeout(request_timeout),
        )
    }

    /// Create a client with an explicit configuration
    pub fn with_config(base_url: &str, config: HttpConfig) -> Result<Self, ServiceError> {
        let base = Url::parse(base_url)
            .map_err(|e| ServiceError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::Config(format!(
                "'{}' cannot be used as a base URL",
                base_url
            )));
        }

        let mut builder = Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if let Some(keepalive) = config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_str: base_url.trim_end_matches('/').to_string(),
            base,
            config,
        })
    }

    /// Get the configuration used to build this client
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Build `<base>/<segments...>`, escaping every segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Config("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Map a non-success status to [`ServiceError::Status`]
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Check the status, then decode the body
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = ensure_success(response).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
}

#[async_trait]
impl TaskService for HttpTaskClient {
    fn base_url(&self) -> &str {
        &self.base_str
    }

    async fn create_task(&self, request: &TaskRequest) -> Result<CreateAck, ServiceError> {
        let url = self.endpoint(&["task", "create"])?;
        tracing::trace!(task_id = %request.id, %url, "POST create");
        let response = self.client.post(url).json(request).send().await?;

        // Status decides; the body is informational only
        let bytes = ensure_success(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::debug!(task_id = %request.id, error = %e, "Unrecognized create body");
            CreateAck::default()
        }))
    }

    async fn get_task(&self, id: &str) -> Result<TaskRecord, ServiceError> {
        let url = self.endpoint(&["task", id])?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn complete_task(&self, id: &str) -> Result<CompletionAck, ServiceError> {
        let url = self.endpoint(&["task", id, "complete"])?;
        tracing::trace!(task_id = id, %url, "POST complete");
        let response = self.client.post(url).send().await?;
        decode(response).await
    }

    async fn stats(&self) -> Result<ServerStats, ServiceError> {
        let url = self.endpoint(&["stats"])?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }
}
