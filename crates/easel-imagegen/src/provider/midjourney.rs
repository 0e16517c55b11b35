mod account;
mod poll;

use async_trait::async_trait;
use easel_config::ProviderKind;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};

use super::{ImageProvider, RequestAdapter};
use crate::{
    error::{ImageGenError, Result},
    http::HttpExecutor,
    types::{CallPolicy, ImageRequest, ImageUrl, RequestConfig, RequestOverrides},
};

pub use account::{MjAccount, select_account};
pub use poll::{PollSettings, PollStep, TaskPoller, TaskStatus, evaluate};

const ACCOUNT_PARAM: &str = "account_id";

/// Midjourney proxy provider
///
/// Submission returns a task id; the image URL is obtained by polling.
pub struct MidjourneyProvider {
    executor: HttpExecutor,
    api_url: String,
    api_key: Option<SecretString>,
    policy: CallPolicy,
    poll: PollSettings,
}

impl MidjourneyProvider {
    /// Create a new Midjourney provider against a proxy base URL
    pub fn new(api_url: &str, api_key: Option<SecretString>, policy: CallPolicy, poll: PollSettings) -> Self {
        Self {
            executor: HttpExecutor::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            policy,
            poll,
        }
    }

    #[must_use]
    pub fn with_executor(mut self, executor: HttpExecutor) -> Self {
        self.executor = executor;
        self
    }

    fn headers(&self) -> IndexMap<String, String> {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        if let Some(key) = &self.api_key {
            headers.insert("mj-api-secret".to_string(), key.expose_secret().to_string());
        }

        headers
    }

    /// Fetch every account known to the proxy
    pub async fn get_accounts(&self) -> Result<Vec<MjAccount>> {
        let url = format!("{}/account/list", self.api_url);
        let body = self.executor.get_json(&url, &self.headers(), self.policy.timeout).await?;

        serde_json::from_value(body).map_err(|e| ImageGenError::Api {
            status: 502,
            message: format!("invalid account list: {e}"),
        })
    }

    /// Fetch one account, `None` if the proxy does not know it
    pub async fn get_account(&self, account_id: &str) -> Result<Option<MjAccount>> {
        let url = format!("{}/account/{account_id}/fetch", self.api_url);
        let body = self
            .executor
            .get_optional_json(&url, &self.headers(), self.policy.timeout)
            .await?;

        body.map(serde_json::from_value)
            .transpose()
            .map_err(|e| ImageGenError::Api {
                status: 502,
                message: format!("invalid account {account_id}: {e}"),
            })
    }

    /// Caller-supplied account id, or the least-loaded available account
    async fn resolve_account(&self, request: &ImageRequest) -> Result<String> {
        match request.param(ACCOUNT_PARAM) {
            Some(Value::String(id)) if !id.is_empty() => return Ok(id.clone()),
            Some(Value::String(_) | Value::Null) | None => {}
            Some(other) => {
                return Err(ImageGenError::InvalidRequest(format!(
                    "{ACCOUNT_PARAM} must be a string, got {other}"
                )));
            }
        }

        let accounts = self.get_accounts().await?;

        let account = select_account(&accounts).ok_or_else(|| {
            tracing::warn!(accounts = accounts.len(), "no Midjourney account has free capacity");
            ImageGenError::NoCapacity("No available Midjourney accounts".to_string())
        })?;

        tracing::debug!(
            account_id = %account.id,
            queue_size = account.queue_size,
            core_size = account.core_size,
            "selected Midjourney account"
        );

        Ok(account.id.clone())
    }

    async fn fetch_task(&self, task_id: &str) -> Result<Value> {
        let url = format!("{}/task/{task_id}/fetch", self.api_url);

        self.executor.get_json(&url, &self.headers(), self.policy.timeout).await
    }
}

impl RequestAdapter for MidjourneyProvider {
    fn create_request(&self, request: &ImageRequest) -> Result<RequestConfig> {
        let mut payload = Map::new();
        payload.insert("prompt".to_string(), json!(request.prompt()));
        payload.insert("base64Array".to_string(), json!([]));
        payload.insert("notifyHook".to_string(), json!(""));
        payload.insert("state".to_string(), json!(""));
        payload.extend(request.additional_params().clone());

        Ok(RequestConfig::new(
            format!("{}/submit/imagine", self.api_url),
            self.headers(),
            Value::Object(payload),
            self.policy,
        ))
    }

    fn transform_response(&self, response: &Value) -> Result<Option<String>> {
        let accepted = response
            .get("code")
            .and_then(Value::as_f64)
            .is_some_and(|code| (code - 1.0).abs() < f64::EPSILON);

        if !accepted {
            let description = response
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("Failed to submit task");

            return Err(ImageGenError::Api {
                status: 400,
                message: description.to_string(),
            });
        }

        let task_id = match response.get("result") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(other) => Some(other.to_string()),
        };

        Ok(task_id)
    }
}

#[async_trait]
impl ImageProvider for MidjourneyProvider {
    async fn generate(&self, request: &ImageRequest) -> Result<Option<ImageUrl>> {
        let account_id = self.resolve_account(request).await?;

        // the account id is fixed before the submit config is built
        let request = request.with_params(RequestOverrides::default().param(ACCOUNT_PARAM, account_id));

        let config = self.create_request(&request)?;
        let response = self.executor.execute(&config).await?;

        let Some(task_id) = self.transform_response(&response)? else {
            tracing::warn!("Midjourney submit returned no task id");
            return Ok(None);
        };

        tracing::debug!(task_id = %task_id, "Midjourney task submitted");

        TaskPoller::new(self.poll)
            .run(&task_id, || self.fetch_task(&task_id))
            .await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Midjourney
    }
}
