//! Task lifecycle logging and notification

use std::sync::Arc;

use crate::{
    tasks::{Task, TaskStatus},
    webhook::WebhookNotifier,
};

/// Emits lifecycle events for generation tasks
#[derive(Clone)]
pub struct TaskEvents {
    notifier: Arc<dyn WebhookNotifier>,
}

impl TaskEvents {
    pub fn new(notifier: Arc<dyn WebhookNotifier>) -> Self {
        Self { notifier }
    }

    pub async fn created(&self, task: &Task) {
        tracing::info!(task_id = %task.task_id, provider = %task.provider, "task created");
        self.deliver("created", task).await;
    }

    pub async fn started(&self, task: &Task) {
        tracing::info!(task_id = %task.task_id, provider = %task.provider, "task started processing");
        tracing::debug!(task_id = %task.task_id, prompt = %task.prompt, "task prompt");
        self.deliver("started", task).await;
    }

    /// Task reached a terminal state, successful or not
    pub async fn completed(&self, task: &Task) {
        if task.status == TaskStatus::Completed {
            tracing::info!(task_id = %task.task_id, result_url = ?task.result_url, "task completed");
        } else {
            tracing::error!(
                task_id = %task.task_id,
                error = task.error_message.as_deref().unwrap_or_default(),
                "task failed"
            );
        }

        self.deliver("completed", task).await;
    }

    pub async fn deleted(&self, task: &Task) {
        tracing::info!(task_id = %task.task_id, final_status = %task.status, "task deleted");
        self.deliver("deleted", task).await;
    }

    async fn deliver(&self, event: &'static str, task: &Task) {
        if !self.notifier.notify(task.webhook_url.as_deref(), task).await {
            tracing::debug!(task_id = %task.task_id, event, "task notification not delivered");
        }
    }
}
