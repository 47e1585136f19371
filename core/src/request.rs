//! Request types sent to the task-processing service

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Priority label attached to every task
///
/// The label is carried to the remote side but must not influence processing
/// order; the distribution analyzer checks exactly that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// Priority 1
    Low = 1,
    /// Priority 2
    Medium = 2,
    /// Priority 3
    High = 3,
}

impl Priority {
    /// All priorities in ascending order
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Numeric wire value
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

/// Priority outside `{1, 2, 3}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("priority must be 1, 2 or 3, got {0}")]
pub struct InvalidPriority(pub u8);

/// Calculation requested from the remote service
///
/// Only the first three variants are on the remote allow-list. `Unsupported`
/// carries any other operation name verbatim so the allow-list can be probed;
/// the remote side is expected to reject it at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `factorial`
    Factorial,
    /// `fibonacci`
    Fibonacci,
    /// `prime_check`
    PrimeCheck,
    /// Any operation name outside the allow-list
    Unsupported(String),
}

impl Operation {
    /// Operations accepted by the remote service
    pub const SUPPORTED: [Operation; 3] = [
        Operation::Factorial,
        Operation::Fibonacci,
        Operation::PrimeCheck,
    ];

    /// Wire name of the operation
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Factorial => "factorial",
            Operation::Fibonacci => "fibonacci",
            Operation::PrimeCheck => "prime_check",
            Operation::Unsupported(name) => name,
        }
    }

    /// Whether the operation is on the remote allow-list
    pub fn is_supported(&self) -> bool {
        !matches!(self, Operation::Unsupported(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "factorial" => Operation::Factorial,
            "fibonacci" => Operation::Fibonacci,
            "prime_check" => Operation::PrimeCheck,
            other => Operation::Unsupported(other.to_string()),
        })
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(name.parse().unwrap_or_else(|never| match never {}))
    }
}

/// One planned task, before an id is assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task title
    pub title: String,
    /// Priority label
    pub priority: Priority,
    /// Requested calculation
    pub operation: Operation,
    /// Calculation input
    pub input: u64,
}

impl TaskSpec {
    /// Create a spec with the default title for its operation
    pub fn new(operation: Operation, input: u64, priority: Priority) -> Self {
        Self {
            title: format!("Performance test {}", operation),
            priority,
            operation,
            input,
        }
    }

    /// Override the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attach an id, producing the immutable request
    pub fn into_request(self, id: impl Into<String>) -> TaskRequest {
        TaskRequest {
            id: id.into(),
            title: self.title,
            priority: self.priority,
            data: TaskData::calculation(self.input, self.operation),
        }
    }
}

/// Body of `POST /task/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Unique task id within the run
    pub id: String,
    /// Task title
    pub title: String,
    /// Priority label
    pub priority: Priority,
    /// Calculation payload
    pub data: TaskData,
}

impl TaskRequest {
    /// Requested operation
    pub fn operation(&self) -> &Operation {
        &self.data.operation
    }

    /// Calculation input
    pub fn input(&self) -> u64 {
        self.data.input
    }
}

/// Calculation payload of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    /// Always `"calculation"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Calculation input
    pub input: u64,
    /// Requested operation
    pub operation: Operation,
}

impl TaskData {
    /// Create a calculation payload
    pub fn calculation(input: u64, operation: Operation) -> Self {
        Self {
            kind: "calculation".to_string(),
            input,
            operation,
        }
    }
}
