//! Outbound task notifications

use std::time::Duration;

use async_trait::async_trait;
use easel_config::WebhookConfig;
use reqwest::Client;

use crate::tasks::Task;

/// Delivers task snapshots to a callback URL
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Send the task to `url`, or to the default target when `url` is `None`
    ///
    /// Best effort: returns whether delivery succeeded and never fails.
    async fn notify(&self, url: Option<&str>, task: &Task) -> bool;
}

/// Webhook notifier that POSTs the task as JSON
pub struct HttpWebhookNotifier {
    client: Client,
    default_url: Option<String>,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpWebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            client: easel_imagegen::http_client(),
            default_url: config.default_url.clone().filter(|url| !url.is_empty()),
            timeout: Duration::from_secs(config.timeout),
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay),
        }
    }

    async fn post_once(&self, url: &str, task: &Task) -> reqwest::Result<()> {
        self.client
            .post(url)
            .timeout(self.timeout)
            .json(task)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhookNotifier {
    async fn notify(&self, url: Option<&str>, task: &Task) -> bool {
        let target = url.filter(|url| !url.is_empty()).or(self.default_url.as_deref());

        let Some(target) = target else {
            tracing::debug!(task_id = %task.task_id, "no webhook URL configured, skipping notification");
            return false;
        };

        if url.is_none() {
            tracing::debug!(task_id = %task.task_id, "using default webhook URL");
        }

        for attempt in 1..=self.max_retries {
            match self.post_once(target, task).await {
                Ok(()) => {
                    tracing::debug!(
                        task_id = %task.task_id,
                        status = %task.status,
                        attempt,
                        "webhook notification sent"
                    );
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %task.task_id,
                        attempt,
                        max_retries = self.max_retries,
                        timeout = e.is_timeout(),
                        error = %e,
                        "webhook notification failed"
                    );

                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        tracing::error!(task_id = %task.task_id, "webhook notification gave up");

        false
    }
}
