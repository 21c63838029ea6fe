//! # vod-search
//!
//! An aggregation core for Maccms-style and TVBox-style video catalog APIs.
//!
//! The library fans a query out over many independently configured sources
//! and provides:
//!
//! - Streaming partial results, one batch per source, as sources answer
//! - Cross-source deduplication on `(sourceId, vod_id)`
//! - Per-source timeout and immediate retry
//! - Separate concurrency limits for searches and detail lookups
//! - A time-bounded detail cache
//! - Cooperative cancellation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vod_search::{Aggregator, CatalogClient, Endpoint, Settings, SettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load("sources.json").await?;
//!     let sources = settings.enabled_sources();
//!     let client = CatalogClient::from_settings(settings, Endpoint::Direct)?;
//!     let aggregator = Aggregator::new(Arc::new(client));
//!
//!     let results = aggregator
//!         .aggregated_search(&sources, "流浪地球", |batch| {
//!             println!("{} new results", batch.len());
//!         }, None, 1)
//!         .await?;
//!
//!     for item in &results {
//!         println!("{} [{}]", item.vod_name, item.source_name.as_deref().unwrap_or("?"));
//!     }
//!     Ok(())
//! }
//! ```

mod aggregator;
mod cache;
mod client;
mod config;
mod covers;
mod episode;
mod error;
mod fetch;
mod limiter;
mod protocol;
mod query;
mod result;
mod settings;
mod source;

#[cfg(test)]
mod testing;

pub use aggregator::Aggregator;
pub use cache::{DetailCache, DETAIL_CACHE_TTL};
pub use client::{CatalogClient, CatalogClientBuilder};
pub use config::ClientConfig;
pub use episode::{next_episode, parse_play_url, parse_tvbox_play_url, previous_episode, Episode};
pub use error::{ErrorKind, Result, SearchError};
pub use fetch::{
    with_timeout_retry, FetchResponse, Fetcher, HttpFetcher, RetryPolicy, DEFAULT_RETRY,
    DEFAULT_TIMEOUT,
};
pub use limiter::{ConcurrencyLimiter, DETAIL_CONCURRENCY, SEARCH_CONCURRENCY};
pub use protocol::{decode, decode_normal, decode_play, decode_tvbox};
pub use query::{ApiQuery, Endpoint, RELAY_PATH};
pub use result::{
    ApiResponse, CatalogPage, Category, PlayTarget, SearchPage, VideoDetail, VideoItem,
    SUCCESS_CODE,
};
pub use settings::{ProxySettings, Settings, SettingsStore};
pub use source::{SourceType, VideoSource};
pub use tokio_util::sync::CancellationToken;
