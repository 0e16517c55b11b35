use std::{future::Future, time::Duration};

use serde_json::Value;

use crate::{
    error::{ImageGenError, Result},
    types::ImageUrl,
};

/// Polling budget for one submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(10),
        }
    }
}

/// Task status as reported by the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    /// Anything the proxy reports that is not listed above
    Other(String),
}

impl TaskStatus {
    /// Map a proxy status string
    ///
    /// Proxies spell the terminal failure both `FAILED` and `FAILURE`, and
    /// report queued jobs as `NOT_START` or `SUBMITTED`.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "PENDING" | "NOT_START" | "SUBMITTED" => Self::Pending,
            "IN_PROGRESS" => Self::InProgress,
            "SUCCESS" => Self::Success,
            "FAILED" | "FAILURE" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Outcome of inspecting one poll response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Completed(Option<ImageUrl>),
    Failed(String),
    Continue(TaskStatus),
}

/// Classify a task fetch response
pub fn evaluate(body: &Value) -> PollStep {
    let status = body.get("status").and_then(Value::as_str).unwrap_or_default();

    match TaskStatus::from_wire(status) {
        TaskStatus::Success => PollStep::Completed(
            body.get("imageUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        TaskStatus::Failed => PollStep::Failed(
            body.get("failReason")
                .and_then(Value::as_str)
                .filter(|reason| !reason.is_empty())
                .unwrap_or("Task failed")
                .to_string(),
        ),
        other => PollStep::Continue(other),
    }
}

/// Attempt counter for a bounded poll loop
#[derive(Debug, Clone, Copy)]
struct PollState {
    attempt: u32,
    max_attempts: u32,
}

impl PollState {
    const fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
        }
    }

    /// Claim the next attempt, or `None` once the budget is spent
    const fn next_attempt(&mut self) -> Option<u32> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        self.attempt += 1;
        Some(self.attempt)
    }

    const fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

/// Drives a task to a terminal state
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    settings: PollSettings,
}

impl TaskPoller {
    pub const fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    /// Fetch the task status until it succeeds, fails or the budget runs out
    ///
    /// Any fetch error ends polling at once. The interval is slept only
    /// between attempts, never after the last one.
    pub async fn run<F, Fut>(&self, task_id: &str, mut fetch: F) -> Result<Option<ImageUrl>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<Value>> + Send,
    {
        let mut state = PollState::new(self.settings.max_attempts);

        while let Some(attempt) = state.next_attempt() {
            let body = fetch().await?;

            match evaluate(&body) {
                PollStep::Completed(url) => {
                    tracing::debug!(task_id, attempt, "Midjourney task completed");
                    return Ok(url);
                }
                PollStep::Failed(reason) => {
                    tracing::warn!(task_id, attempt, reason = %reason, "Midjourney task failed");
                    return Err(ImageGenError::Api {
                        status: 400,
                        message: reason,
                    });
                }
                PollStep::Continue(status) => {
                    tracing::debug!(task_id, attempt, status = ?status, "Midjourney task still running");

                    if state.has_remaining() {
                        tokio::time::sleep(self.settings.interval).await;
                    }
                }
            }
        }

        Err(ImageGenError::PollTimeout(
            "Timeout waiting for task completion".to_string(),
        ))
    }
}
