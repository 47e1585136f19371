//! In-memory task service for tests

use crate::request::{Operation, TaskRequest};
use crate::response::{CompletionAck, CreateAck, ServerStats, TaskRecord, TaskStatus};
use crate::traits::{ServiceError, TaskService};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How the mock deviates from a well-behaved server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockBehavior {
    /// pending -> processing(result) -> completed via the completion call
    Normal,
    /// Tasks stay pending forever
    NeverProcess,
    /// Tasks jump straight to completed
    AutoComplete,
    /// Completion call errors, but the task is completed anyway
    CompletionRace,
    /// Completion call errors and the task stays processing
    CompletionFails,
    /// Tasks end up failed
    FailTasks,
    /// Creation answers 500
    CreateFails,
    /// Unsupported operations are accepted like any other
    AcceptUnsupported,
    /// Every call times out at the transport level
    Unreachable,
    /// Reading a task panics
    PanicOnPoll,
}

struct MockTask {
    operation: Operation,
    input: u64,
    polls: usize,
    status: TaskStatus,
    result: Option<String>,
}

pub(crate) struct MockTaskService {
    behavior: MockBehavior,
    polls_until_processed: usize,
    delay: Option<Duration>,
    tasks: Mutex<HashMap<String, MockTask>>,
    processed_order: Mutex<Vec<String>>,
    creates: AtomicUsize,
    gets: AtomicUsize,
    completes: AtomicUsize,
}

impl MockTaskService {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            polls_until_processed: 1,
            delay: None,
            tasks: Mutex::new(HashMap::new()),
            processed_order: Mutex::new(Vec::new()),
            creates: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
        }
    }

    pub fn normal() -> Self {
        Self::new(MockBehavior::Normal)
    }

    /// Number of reads before a pending task is processed
    pub fn with_polls_until_processed(mut self, polls: usize) -> Self {
        self.polls_until_processed = polls;
        self
    }

    /// Delay applied to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn completes(&self) -> usize {
        self.completes.load(Ordering::SeqCst)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Ids in the order the mock moved them out of pending
    pub fn processed_order(&self) -> Vec<String> {
        self.processed_order.lock().unwrap().clone()
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.lock().unwrap().get(id).map(|t| t.status)
    }

    async fn simulate(&self) -> Result<(), ServiceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.behavior == MockBehavior::Unreachable {
            return Err(ServiceError::Timeout(Duration::from_secs(5)));
        }
        Ok(())
    }
}

fn status_error(status: u16, body: &str) -> ServiceError {
    ServiceError::Status {
        status,
        body: body.to_string(),
    }
}

/// Reference calculation for supported operations
pub(crate) fn calculate(operation: &Operation, input: u64) -> Option<String> {
    match operation {
        Operation::Factorial => {
            let value = (1..=input as u128).try_fold(1u128, |acc, n| acc.checked_mul(n))?;
            Some(value.to_string())
        }
        Operation::Fibonacci => {
            let (mut a, mut b) = (0u128, 1u128);
            for _ in 0..input {
                let next = a.checked_add(b)?;
                a = b;
                b = next;
            }
            Some(a.to_string())
        }
        Operation::PrimeCheck => {
            let prime = input >= 2 && (2..).take_while(|d| d * d <= input).all(|d| input % d != 0);
            Some(prime.to_string())
        }
        Operation::Unsupported(_) => None,
    }
}

#[async_trait]
impl TaskService for MockTaskService {
    fn base_url(&self) -> &str {
        "mock://tasks"
    }

    async fn create_task(&self, request: &TaskRequest) -> Result<CreateAck, ServiceError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        if self.behavior == MockBehavior::CreateFails {
            return Err(status_error(500, "Internal Server Error"));
        }
        if !request.operation().is_supported() && self.behavior != MockBehavior::AcceptUnsupported {
            return Err(status_error(400, "Unsupported operation"));
        }

        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(&request.id) {
            return Err(status_error(409, "Task already exists"));
        }
        tasks.insert(
            request.id.clone(),
            MockTask {
                operation: request.operation().clone(),
                input: request.input(),
                polls: 0,
                status: TaskStatus::Pending,
                result: None,
            },
        );

        Ok(CreateAck {
            task_id: Some(request.id.clone()),
            status: Some(TaskStatus::Pending),
        })
    }

    async fn get_task(&self, id: &str) -> Result<TaskRecord, ServiceError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        if self.behavior == MockBehavior::PanicOnPoll {
            panic!("mock panic while reading {id}");
        }

        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| status_error(404, "Task not found"))?;

        task.polls += 1;
        if task.status == TaskStatus::Pending && task.polls >= self.polls_until_processed {
            let result = calculate(&task.operation, task.input);
            let next = match self.behavior {
                MockBehavior::NeverProcess => None,
                MockBehavior::AutoComplete => Some(TaskStatus::Completed),
                MockBehavior::FailTasks => Some(TaskStatus::Failed),
                _ => Some(TaskStatus::Processing),
            };
            if let Some(status) = next {
                task.status = status;
                task.result = result;
                self.processed_order.lock().unwrap().push(id.to_string());
            }
        }

        Ok(TaskRecord {
            id: Some(id.to_string()),
            status: task.status,
            priority: None,
            result: task.result.clone(),
        })
    }

    async fn complete_task(&self, id: &str) -> Result<CompletionAck, ServiceError> {
        self.completes.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| status_error(404, "Task not found"))?;

        match self.behavior {
            MockBehavior::CompletionRace => {
                task.status = TaskStatus::Completed;
                Err(status_error(409, "Task already completed"))
            }
            MockBehavior::CompletionFails => Err(status_error(500, "Internal Server Error")),
            _ if task.status == TaskStatus::Processing => {
                task.status = TaskStatus::Completed;
                Ok(CompletionAck {
                    status: TaskStatus::Completed,
                })
            }
            _ => Err(status_error(400, "Task is not processing")),
        }
    }

    async fn stats(&self) -> Result<ServerStats, ServiceError> {
        self.simulate().await?;
        let tasks = self.tasks.lock().unwrap();
        let count = |status| tasks.values().filter(|t| t.status == status).count() as u64;

        Ok(ServerStats {
            total_workers: 4,
            total_tasks_processed: count(TaskStatus::Processing) + count(TaskStatus::Completed),
            total_tasks_completed: count(TaskStatus::Completed),
            total_tasks_failed: count(TaskStatus::Failed),
            uptime_seconds: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_calculation() {
        assert_eq!(calculate(&Operation::Factorial, 5).as_deref(), Some("120"));
        assert_eq!(calculate(&Operation::Fibonacci, 10).as_deref(), Some("55"));
        assert_eq!(calculate(&Operation::PrimeCheck, 17).as_deref(), Some("true"));
        assert_eq!(calculate(&Operation::PrimeCheck, 100).as_deref(), Some("false"));
        assert_eq!(calculate(&Operation::Unsupported("power".into()), 2), None);
    }
}
