//! Core trait for the remote task-processing service
//!
//! The trait is defined in core so the workflow driver can be exercised
//! against in-memory doubles; the HTTP implementation lives in the client crate.

use crate::request::TaskRequest;
use crate::response::{CompletionAck, CreateAck, ServerStats, TaskRecord};
use async_trait::async_trait;
use std::time::Duration;

/// Remote task-processing service
///
/// Every method maps to one HTTP call. Implementations must not retry; the
/// workflow driver owns polling, timeouts and race tolerance.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Base URL of the target, for diagnostics
    fn base_url(&self) -> &str;

    /// `POST /task/create`
    async fn create_task(&self, request: &TaskRequest) -> Result<CreateAck, ServiceError>;

    /// `GET /task/{id}`
    async fn get_task(&self, id: &str) -> Result<TaskRecord, ServiceError>;

    /// `POST /task/{id}/complete`
    async fn complete_task(&self, id: &str) -> Result<CompletionAck, ServiceError>;

    /// `GET /stats`
    async fn stats(&self) -> Result<ServerStats, ServiceError>;
}

/// Errors at the transport boundary
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// HTTP/network error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Call exceeded its timeout
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid client configuration (bad base URL, ...)
    #[error("configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// HTTP status when the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the remote answered with a non-success status
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::Status { .. })
    }

    /// Whether the call ran out of time
    pub fn is_timeout(&self) -> bool {
        match self {
            ServiceError::Timeout(_) => true,
            ServiceError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Run a service call under a timeout, mapping expiry to [`ServiceError::Timeout`]
pub async fn call_with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ServiceError>
where
    F: std::future::Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout(timeout)),
    }
}
