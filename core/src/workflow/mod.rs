//! Workflow driver: one task's full create -> poll -> complete lifecycle
//!
//! The driver is deliberately small. For each [`TaskRequest`](crate::TaskRequest) it:
//!
//! 1. Creates the task; a non-success status for an operation outside the
//!    allow-list is an expected rejection, not a defect
//! 2. Polls at a fixed interval until the task leaves `pending`
//!    (a `processing` record without a result is not yet observable)
//! 3. Issues the completion call for `processing` + result, or accepts a task
//!    the remote already moved to `completed` without calling again
//! 4. Tolerates the completion race: a failed completion call followed by a
//!    read showing `completed` still counts as success (logged distinctly)
//! 5. Returns a timed [`WorkflowOutcome`], never an error
//!
//! Every network call is bounded by the per-call timeout and by what is left
//! of the workflow budget, so a workflow always ends within its budget.
//!
//! # Example
//!
//! ```ignore
//! let driver = WorkflowDriver::from_config(service, &config);
//! let outcome = driver.run(spec.into_request(ids.next("rust"))).await;
//! assert!(outcome.is_success());
//! ```

mod driver;
mod error;
mod outcome;

pub use driver::WorkflowDriver;
pub use error::{FailureKind, WorkflowError};
pub use outcome::{CompletionPath, OutcomeStatus, WorkflowOutcome};

#[cfg(test)]
mod tests;
