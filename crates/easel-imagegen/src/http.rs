use std::{sync::OnceLock, time::Duration};

use indexmap::IndexMap;
use reqwest::{
    Client, Response, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;

use crate::{
    error::{ImageGenError, Result},
    types::RequestConfig,
};

/// Common HTTP client to reuse connections across providers
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_idle_timeout(Some(Duration::from_secs(5)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}

/// Performs outbound provider calls
///
/// POSTs go through a fixed-delay retry loop. GETs used for status
/// lookups are single attempts; callers own their retry policy.
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self { client: http_client() }
    }

    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// POST the configured payload and return the parsed JSON body
    ///
    /// Makes up to `max_retries` attempts (at least one), sleeping
    /// `retry_delay` between them. Transport failures and non-200
    /// statuses are retried alike; the last error is returned.
    pub async fn execute(&self, config: &RequestConfig) -> Result<Value> {
        let max_attempts = config.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match self.post_once(config).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        url = %config.url,
                        attempt,
                        max_attempts,
                        error = %e,
                        "provider request failed, retrying"
                    );
                    tokio::time::sleep(config.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        url = %config.url,
                        attempts = attempt,
                        error = %e,
                        "provider request failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn post_once(&self, config: &RequestConfig) -> Result<Value> {
        // `headers` replaces rather than appends, so it must follow `json`
        let response = self
            .client
            .post(&config.url)
            .timeout(config.timeout)
            .json(&config.payload)
            .headers(header_map(&config.headers)?)
            .send()
            .await?;

        read_json(response).await
    }

    /// Single GET returning the parsed JSON body
    pub async fn get_json(&self, url: &str, headers: &IndexMap<String, String>, timeout: Duration) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .headers(header_map(headers)?)
            .send()
            .await?;

        read_json(response).await
    }

    /// Single GET that maps a 404 to `None`
    pub async fn get_optional_json(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
        timeout: Duration,
    ) -> Result<Option<Value>> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .headers(header_map(headers)?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        read_json(response).await.map(Some)
    }
}

fn header_map(headers: &IndexMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ImageGenError::InvalidRequest(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ImageGenError::InvalidRequest(format!("invalid value for header {name}: {e}")))?;

        map.insert(name, value);
    }

    Ok(map)
}

async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();

    if status == StatusCode::OK {
        return Ok(response.json::<Value>().await?);
    }

    let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    Err(ImageGenError::Api {
        status: status.as_u16(),
        message,
    })
}
