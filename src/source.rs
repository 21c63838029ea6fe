//! Video source descriptors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::RetryPolicy;

/// Protocol family spoken by a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Maccms-style catalog (`ac`/`wd`/`pg`/`t` parameters, `code == 1` sentinel).
    #[default]
    Normal,
    /// Crawler-backed source using `act=home|category|detail|play|search`.
    Tvbox,
}

/// One configured upstream video-catalog API.
///
/// Field names follow the persisted settings document (`apiUrl`,
/// `proxyEnabled`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    /// Stable identifier, used in dedup and cache keys.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short key chosen by the user.
    #[serde(default)]
    pub key: String,
    /// Upstream base endpoint.
    #[serde(default)]
    pub api_url: String,
    /// Whether the source takes part in searches.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `Some(false)` opts the source out of the acceleration relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_enabled: Option<bool>,
    /// Protocol family.
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    /// Request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Number of immediate retries after a failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl VideoSource {
    /// Creates a normal source with default policy.
    pub fn new(id: impl Into<String>, name: impl Into<String>, api_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            key: id.clone(),
            id,
            name: name.into(),
            api_url: api_url.into(),
            enabled: true,
            proxy_enabled: None,
            source_type: SourceType::Normal,
            timeout: None,
            retry: None,
        }
    }

    /// Sets the protocol family.
    pub fn with_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Sets the request timeout in milliseconds.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    /// Sets the retry count.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Opts in or out of the acceleration relay.
    pub fn with_proxy_enabled(mut self, enabled: bool) -> Self {
        self.proxy_enabled = Some(enabled);
        self
    }

    /// Marks the source as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns whether the source is a TVBox crawler source.
    pub fn is_tvbox(&self) -> bool {
        self.source_type == SourceType::Tvbox
    }

    /// Returns whether an API URL is configured.
    pub fn has_api_url(&self) -> bool {
        !self.api_url.trim().is_empty()
    }

    /// Resolves the request policy for this source.
    ///
    /// A missing or zero timeout falls back to `defaults`; a missing retry
    /// count does too. An explicit `retry: 0` disables retries. Note that
    /// other consumers of the same settings document read a zero retry
    /// count as the default of 2.
    pub fn request_policy(&self, defaults: RetryPolicy) -> RetryPolicy {
        let timeout = match self.timeout {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => defaults.timeout,
        };
        RetryPolicy {
            timeout,
            retry: self.retry.unwrap_or(defaults.retry),
        }
    }
}
