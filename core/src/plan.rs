//! Batch planning: which tasks a run creates

use crate::config::BenchConfig;
use crate::request::{Operation, Priority, TaskSpec};

/// Deterministic plan of task specs for one run
///
/// Task `i` uses `operations[i % len]` and `priorities[i % len]`, so with the
/// default three priorities the batch is perfectly interleaved `1,2,3,1,2,3,...`.
#[derive(Debug, Clone)]
pub struct TaskPlan {
    operations: Vec<Operation>,
    priorities: Vec<Priority>,
    total: usize,
}

impl TaskPlan {
    /// Plan `total` tasks cycling the given operations and priorities
    pub fn new(operations: Vec<Operation>, priorities: Vec<Priority>, total: usize) -> Self {
        Self {
            operations,
            priorities,
            total,
        }
    }

    /// Plan matching a validated configuration
    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(
            config.operations.clone(),
            config.priorities.clone(),
            config.total_tasks,
        )
    }

    /// Number of planned tasks
    pub fn len(&self) -> usize {
        if self.operations.is_empty() || self.priorities.is_empty() {
            0
        } else {
            self.total
        }
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spec of task `index`
    pub fn spec(&self, index: usize) -> Option<TaskSpec> {
        if index >= self.len() {
            return None;
        }
        let operation = self.operations[index % self.operations.len()].clone();
        let priority = self.priorities[index % self.priorities.len()];
        let input = input_for(&operation, index);
        Some(TaskSpec::new(operation, input, priority))
    }

    /// All planned specs in order
    pub fn specs(&self) -> impl Iterator<Item = TaskSpec> + '_ {
        (0..self.len()).filter_map(move |i| self.spec(i))
    }
}

/// Inputs stay small enough for every remote limit (factorial <= 20, fibonacci <= 93)
fn input_for(operation: &Operation, index: usize) -> u64 {
    let i = index as u64;
    match operation {
        Operation::Factorial => 5 + i % 10,
        Operation::Fibonacci => 10 + i % 20,
        Operation::PrimeCheck => 100 + i % 100,
        Operation::Unsupported(_) => 16,
    }
}
