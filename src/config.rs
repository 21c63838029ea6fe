//! Client tuning configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::{RetryPolicy, DEFAULT_RETRY};
use crate::limiter::{DETAIL_CONCURRENCY, SEARCH_CONCURRENCY};

/// Tuning knobs for [`CatalogClient`](crate::CatalogClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Concurrent searches across sources.
    #[serde(default = "default_search_concurrency")]
    pub search_concurrency: usize,
    /// Concurrent detail and cover lookups.
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
    /// Detail cache TTL in seconds.
    #[serde(default = "default_detail_cache_ttl_secs")]
    pub detail_cache_ttl_secs: u64,
    /// Default per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Default retry count.
    #[serde(default = "default_retry")]
    pub retry: u32,
    /// Items per cover-resolution chunk.
    #[serde(default = "default_cover_batch_size")]
    pub cover_batch_size: usize,
    /// Pause between cover-resolution chunks in milliseconds.
    #[serde(default = "default_cover_batch_delay_ms")]
    pub cover_batch_delay_ms: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Outbound HTTP or SOCKS5 proxy, e.g. `socks5://127.0.0.1:1080`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
}

fn default_search_concurrency() -> usize {
    SEARCH_CONCURRENCY
}

fn default_detail_concurrency() -> usize {
    DETAIL_CONCURRENCY
}

fn default_detail_cache_ttl_secs() -> u64 {
    300
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retry() -> u32 {
    DEFAULT_RETRY
}

fn default_cover_batch_size() -> usize {
    3
}

fn default_cover_batch_delay_ms() -> u64 {
    200
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; vod-search/0.1)".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            search_concurrency: default_search_concurrency(),
            detail_concurrency: default_detail_concurrency(),
            detail_cache_ttl_secs: default_detail_cache_ttl_secs(),
            timeout_ms: default_timeout_ms(),
            retry: default_retry(),
            cover_batch_size: default_cover_batch_size(),
            cover_batch_delay_ms: default_cover_batch_delay_ms(),
            user_agent: default_user_agent(),
            http_proxy: None,
        }
    }
}

impl ClientConfig {
    /// Default request policy for sources that do not override it.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.timeout_ms), self.retry)
    }

    /// Detail cache TTL.
    pub fn detail_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_cache_ttl_secs)
    }

    /// Pause between cover-resolution chunks.
    pub fn cover_batch_delay(&self) -> Duration {
        Duration::from_millis(self.cover_batch_delay_ms)
    }
}
