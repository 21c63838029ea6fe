//! HTTP fetching with a per-attempt deadline and immediate retry.
//!
//! Retries are issued back to back with no backoff. Catalog queries are
//! short-lived and a slow source is better reported quickly than waited on.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::{Result, SearchError};

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY: u32 = 2;

/// Deadline and retry budget for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline applied to each attempt separately.
    pub timeout: Duration,
    /// Attempts made after the first one fails.
    pub retry: u32,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(timeout: Duration, retry: u32) -> Self {
        Self { timeout, retry }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: DEFAULT_RETRY,
        }
    }
}

/// A settled HTTP response. The status is not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl FetchResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Transport used by the catalog client.
///
/// Implementations enforce `policy` themselves; see [`with_timeout_retry`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a GET request.
    async fn fetch(&self, url: &str, policy: RetryPolicy) -> Result<FetchResponse>;
}

/// Runs `attempt` under `policy`.
///
/// Each attempt is raced against `policy.timeout`; an expired attempt is
/// dropped, which aborts whatever it had in flight. Any failure is retried
/// immediately while budget remains, after which the last error is returned.
pub async fn with_timeout_retry<F, Fut, T>(policy: RetryPolicy, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut remaining = policy.retry;
    loop {
        let outcome = match timeout(policy.timeout, attempt()).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if remaining > 0 => {
                warn!("Request failed, retrying ({} left): {}", remaining, e);
                remaining -= 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// A fetcher backed by reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given user agent.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// Creates a fetcher from the client configuration, routing through
    /// `httpProxy` when one is set.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(proxy_url) = config.http_proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            debug!("Using proxy: {}", proxy_url);
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Creates a fetcher with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn attempt(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, policy: RetryPolicy) -> Result<FetchResponse> {
        debug!("GET {}", url);
        with_timeout_retry(policy, || self.attempt(url)).await
    }
}
