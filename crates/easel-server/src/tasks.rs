//! Generation task records and their in-memory store

use dashmap::DashMap;
use easel_imagegen::ProviderKind;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of one generation task as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub prompt: String,
    pub provider: ProviderKind,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    /// Per-task notification target; never echoed back
    #[serde(skip)]
    pub webhook_url: Option<String>,
}

impl Task {
    /// New pending task with a fresh id
    pub fn new(prompt: impl Into<String>, provider: ProviderKind, webhook_url: Option<String>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            status: TaskStatus::Pending,
            prompt: prompt.into(),
            provider,
            created_at: Timestamp::now(),
            completed_at: None,
            result_url: None,
            error_message: None,
            webhook_url,
        }
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Processing;
    }

    pub fn complete(&mut self, result_url: String) {
        self.status = TaskStatus::Completed;
        self.result_url = Some(result_url);
        self.completed_at = Some(Timestamp::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(message.into());
        self.completed_at = Some(Timestamp::now());
    }
}

/// Storage for task records
///
/// Implementations must tolerate concurrent access from many background
/// units at once.
pub trait TaskStore: Send + Sync {
    fn get(&self, task_id: &Uuid) -> Option<Task>;

    /// Insert or replace the record for `task.task_id`
    fn save(&self, task: Task);

    /// Replace the record only if it still exists
    ///
    /// Returns `false`, storing nothing, when the task was removed. The
    /// check and the write happen atomically.
    fn update(&self, task: Task) -> bool;

    /// Remove a record, returning it if it existed
    fn remove(&self, task_id: &Uuid) -> Option<Task>;

    /// Remove a record, reporting whether it existed
    fn delete(&self, task_id: &Uuid) -> bool {
        self.remove(task_id).is_some()
    }
}

/// Process-lifetime task store
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: DashMap<Uuid, Task>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, task_id: &Uuid) -> Option<Task> {
        self.tasks.get(task_id).map(|entry| entry.value().clone())
    }

    fn save(&self, task: Task) {
        self.tasks.insert(task.task_id, task);
    }

    fn update(&self, task: Task) -> bool {
        match self.tasks.get_mut(&task.task_id) {
            Some(mut entry) => {
                *entry = task;
                true
            }
            None => false,
        }
    }

    fn remove(&self, task_id: &Uuid) -> Option<Task> {
        self.tasks.remove(task_id).map(|(_, task)| task)
    }
}
