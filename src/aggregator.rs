//! Streaming fan-out search across sources.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::CatalogClient;
use crate::source::VideoSource;
use crate::{Result, SearchError, VideoItem};

/// Fans a query out over many sources, delivering each source's new items
/// as soon as they arrive.
///
/// Items are deduplicated on `(sourceId, vod_id)` within one invocation;
/// the first source to deliver a key wins.
#[derive(Clone)]
pub struct Aggregator {
    client: Arc<CatalogClient>,
}

impl Aggregator {
    /// Creates an aggregator over `client`.
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &Arc<CatalogClient> {
        &self.client
    }

    /// Searches every source in `sources` through the search limiter.
    ///
    /// `on_new_results` is called at most once per source with that
    /// source's newly seen items, in the source's own order. A failing
    /// source is logged and contributes nothing.
    ///
    /// When `cancel` fires, the call returns [`SearchError::Cancelled`]
    /// right away and no further batches are delivered. Sources still
    /// waiting for a limiter slot are never requested. Requests already
    /// dispatched keep running until their own deadline and their results
    /// are discarded. A batch being delivered at the moment of cancellation
    /// may still reach the callback.
    pub async fn aggregated_search<F>(
        &self,
        sources: &[VideoSource],
        query: &str,
        on_new_results: F,
        cancel: Option<&CancellationToken>,
        page: u32,
    ) -> Result<Vec<VideoItem>>
    where
        F: Fn(Vec<VideoItem>) + Send + Sync + 'static,
    {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let token = cancel.cloned().unwrap_or_else(CancellationToken::new);
        if token.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        debug!("Aggregated search for {:?} over {} sources", query, sources.len());

        let seen = Arc::new(Mutex::new(HashSet::<(String, String)>::new()));
        let on_new_results = Arc::new(on_new_results);
        let query: Arc<str> = Arc::from(query);

        let tasks: Vec<_> = sources
            .iter()
            .cloned()
            .map(|source| {
                let client = Arc::clone(&self.client);
                let seen = Arc::clone(&seen);
                let on_new_results = Arc::clone(&on_new_results);
                let query = Arc::clone(&query);
                let token = token.clone();

                tokio::spawn(async move {
                    let found = client
                        .search_limiter()
                        .run(|| async {
                            // Queued units admitted after cancellation send nothing.
                            if token.is_cancelled() {
                                return Vec::new();
                            }
                            match client.search_videos(&source, &query, page).await {
                                Ok(result) => {
                                    debug!("Source {} returned {} results", source.name, result.list.len());
                                    result.list
                                }
                                Err(e) => {
                                    if !token.is_cancelled() {
                                        warn!("Source {} search failed: {}", source.name, e);
                                    }
                                    Vec::new()
                                }
                            }
                        })
                        .await;

                    if token.is_cancelled() {
                        return Vec::new();
                    }

                    let fresh: Vec<VideoItem> = {
                        let mut seen = seen.lock().await;
                        found
                            .into_iter()
                            .filter(|item| seen.insert(item.dedup_key()))
                            .collect()
                    };

                    if !fresh.is_empty() && !token.is_cancelled() {
                        on_new_results(fresh.clone());
                    }
                    fresh
                })
            })
            .collect();

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Aggregated search for {:?} cancelled", query);
                Err(SearchError::Cancelled)
            }
            batches = join_all(tasks) => {
                let mut results = Vec::new();
                for batch in batches {
                    match batch {
                        Ok(items) => results.extend(items),
                        Err(e) => warn!("Search task failed: {}", e),
                    }
                }
                Ok(results)
            }
        }
    }
}
