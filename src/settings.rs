//! Read-only access to persisted source settings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::source::{SourceType, VideoSource};
use crate::{Result, SearchError};

/// Global acceleration relay setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    pub enabled: bool,
    #[serde(default)]
    pub proxy_url: String,
}

impl ProxySettings {
    /// An enabled relay at `proxy_url`.
    pub fn enabled(proxy_url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            proxy_url: proxy_url.into(),
        }
    }

    /// The relay URL if it is enabled and non-empty.
    pub fn active_url(&self) -> Option<&str> {
        let url = self.proxy_url.trim();
        (self.enabled && !url.is_empty()).then_some(url)
    }
}

/// Synchronous accessor over externally persisted settings.
pub trait SettingsStore: Send + Sync {
    /// All configured sources.
    fn sources(&self) -> Vec<VideoSource>;

    /// The global acceleration relay setting, if any.
    fn proxy_settings(&self) -> Option<ProxySettings>;

    /// Sources that are not disabled.
    fn enabled_sources(&self) -> Vec<VideoSource> {
        self.sources().into_iter().filter(|s| s.enabled).collect()
    }

    /// Enabled sources of one protocol family.
    fn enabled_sources_of(&self, source_type: SourceType) -> Vec<VideoSource> {
        self.enabled_sources()
            .into_iter()
            .filter(|s| s.source_type == source_type)
            .collect()
    }

    /// Looks up a source by id.
    fn find_source(&self, id: &str) -> Option<VideoSource> {
        self.sources().into_iter().find(|s| s.id == id)
    }
}

/// The settings document.
///
/// ```json
/// {
///   "videoSources": [{"id": "bfzy", "name": "暴风", "apiUrl": "https://..."}],
///   "proxySettings": {"enabled": true, "proxyUrl": "https://relay.example.workers.dev"},
///   "client": {"timeoutMs": 8000}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub video_sources: Vec<VideoSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_settings: Option<ProxySettings>,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Settings {
    /// Creates empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a settings document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SearchError::Settings(e.to_string()))
    }

    /// Loads a settings document from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SearchError::Settings(format!("{}: {}", path.display(), e)))?;
        let settings = Self::from_json(&json)?;
        debug!(
            "Loaded {} video sources from {}",
            settings.video_sources.len(),
            path.display()
        );
        Ok(settings)
    }

    /// Adds a source.
    pub fn with_source(mut self, source: VideoSource) -> Self {
        self.video_sources.push(source);
        self
    }

    /// Sets the acceleration relay.
    pub fn with_proxy_settings(mut self, proxy: ProxySettings) -> Self {
        self.proxy_settings = Some(proxy);
        self
    }
}

impl SettingsStore for Settings {
    fn sources(&self) -> Vec<VideoSource> {
        self.video_sources.clone()
    }

    fn proxy_settings(&self) -> Option<ProxySettings> {
        self.proxy_settings.clone()
    }
}
