//! Validation probes run before the benchmark proper
//!
//! Two kinds of checks, both driven through the regular workflow driver:
//! - known answers: a handful of calculations whose result is fixed
//! - allow-list: operations the remote must refuse at creation

use crate::id::IdGenerator;
use crate::request::{Operation, Priority, TaskSpec};
use crate::workflow::{FailureKind, WorkflowDriver, WorkflowOutcome};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A calculation with a fixed expected result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownAnswer {
    /// Operation
    pub operation: Operation,
    /// Input
    pub input: u64,
    /// Result the remote must report
    pub expected: &'static str,
}

/// Calculations checked by [`ValidationProbe::known_answers`]
pub static KNOWN_ANSWERS: [KnownAnswer; 3] = [
    KnownAnswer {
        operation: Operation::Factorial,
        input: 5,
        expected: "120",
    },
    KnownAnswer {
        operation: Operation::Fibonacci,
        input: 10,
        expected: "55",
    },
    KnownAnswer {
        operation: Operation::PrimeCheck,
        input: 17,
        expected: "true",
    },
];

/// Operations outside the allow-list, with the input sent for each
pub fn disallowed_operations() -> Vec<(Operation, u64)> {
    [("square_root", 16), ("power", 2), ("logarithm", 10)]
        .into_iter()
        .map(|(name, input)| (Operation::Unsupported(name.to_string()), input))
        .collect()
}

/// Verdict of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeVerdict {
    /// Behaved as expected
    Pass,
    /// Completed, but not as expected
    Warn,
    /// Did not behave as expected
    Fail,
}

impl fmt::Display for ProbeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeVerdict::Pass => "PASS",
            ProbeVerdict::Warn => "WARN",
            ProbeVerdict::Fail => "FAIL",
        })
    }
}

/// One named check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeCheck {
    /// Check name, e.g. `factorial(5)`
    pub name: String,
    /// Verdict
    pub verdict: ProbeVerdict,
    /// What was observed
    pub detail: String,
}

/// All checks run against one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Target label
    pub label: String,
    /// Checks in execution order
    pub checks: Vec<ProbeCheck>,
}

impl ProbeReport {
    /// Number of checks with the given verdict
    pub fn count(&self, verdict: ProbeVerdict) -> usize {
        self.checks.iter().filter(|c| c.verdict == verdict).count()
    }

    /// Whether no check failed
    pub fn passed(&self) -> bool {
        self.count(ProbeVerdict::Fail) == 0
    }
}

/// Runs validation checks against one target
pub struct ValidationProbe {
    driver: WorkflowDriver,
    ids: Arc<IdGenerator>,
    label: String,
}

impl ValidationProbe {
    /// Create a probe using `driver`; ids are drawn from `ids` under `label`
    pub fn new(driver: WorkflowDriver, ids: Arc<IdGenerator>, label: impl Into<String>) -> Self {
        Self {
            driver,
            ids,
            label: label.into(),
        }
    }

    /// Run the known-answer checks and, optionally, the allow-list checks
    pub async fn run(&self, include_allow_list: bool) -> ProbeReport {
        let mut checks = self.known_answers().await;
        if include_allow_list {
            checks.extend(self.allow_list().await);
        }

        let report = ProbeReport {
            label: self.label.clone(),
            checks,
        };
        tracing::info!(
            label = %self.label,
            passed = report.count(ProbeVerdict::Pass),
            warnings = report.count(ProbeVerdict::Warn),
            failed = report.count(ProbeVerdict::Fail),
            "Validation probes finished"
        );
        report
    }

    /// Check that fixed calculations come back with the right result
    pub async fn known_answers(&self) -> Vec<ProbeCheck> {
        let outcomes = join_all(KNOWN_ANSWERS.iter().map(|answer| {
            self.drive(answer.operation.clone(), answer.input, Priority::High)
        }))
        .await;

        KNOWN_ANSWERS
            .iter()
            .zip(outcomes)
            .map(|(answer, outcome)| {
                let name = format!("{}({})", answer.operation, answer.input);
                let (verdict, detail) = match outcome.result.as_deref() {
                    _ if !outcome.is_success() => (ProbeVerdict::Fail, failure_detail(&outcome)),
                    Some(result) if result == answer.expected => {
                        (ProbeVerdict::Pass, format!("= {}", result))
                    }
                    other => {
                        tracing::warn!(
                            label = %self.label,
                            check = %name,
                            expected = answer.expected,
                            got = ?other,
                            "Unexpected calculation result"
                        );
                        (
                            ProbeVerdict::Warn,
                            format!(
                                "expected {}, got {}",
                                answer.expected,
                                other.unwrap_or("nothing")
                            ),
                        )
                    }
                };
                ProbeCheck {
                    name,
                    verdict,
                    detail,
                }
            })
            .collect()
    }

    /// Check that operations outside the allow-list are refused at creation
    pub async fn allow_list(&self) -> Vec<ProbeCheck> {
        let disallowed = disallowed_operations();
        let outcomes = join_all(
            disallowed
                .iter()
                .map(|(operation, input)| self.drive(operation.clone(), *input, Priority::Low)),
        )
        .await;

        disallowed
            .iter()
            .zip(outcomes)
            .map(|((operation, input), outcome)| {
                let (verdict, detail) = if outcome.is_rejected() {
                    (ProbeVerdict::Pass, "rejected as expected".to_string())
                } else if outcome.failure() == Some(FailureKind::UnexpectedAcceptance) {
                    (ProbeVerdict::Fail, "accepted by the remote".to_string())
                } else {
                    (ProbeVerdict::Fail, failure_detail(&outcome))
                };
                ProbeCheck {
                    name: format!("reject {}({})", operation, input),
                    verdict,
                    detail,
                }
            })
            .collect()
    }

    async fn drive(&self, operation: Operation, input: u64, priority: Priority) -> WorkflowOutcome {
        let title = format!("Validation {}", operation);
        let request = TaskSpec::new(operation, input, priority)
            .with_title(title)
            .into_request(self.ids.next(&self.label));
        self.driver.run(request).await
    }
}

fn failure_detail(outcome: &WorkflowOutcome) -> String {
    match &outcome.error {
        Some(error) => format!("{}: {}", outcome.status.label(), error),
        None => outcome.status.label().to_string(),
    }
}
