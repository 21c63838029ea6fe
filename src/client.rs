//! Per-source catalog queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::DetailCache;
use crate::config::ClientConfig;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::limiter::ConcurrencyLimiter;
use crate::protocol;
use crate::query::{ApiQuery, Endpoint};
use crate::result::{CatalogPage, Category, PlayTarget, SearchPage, VideoItem};
use crate::settings::{Settings, SettingsStore};
use crate::source::VideoSource;
use crate::{Result, SearchError};

/// Client for one or more catalog sources.
///
/// Owns the detail cache and the two limiters, so independent clients do not
/// share state.
pub struct CatalogClient {
    fetcher: Arc<dyn Fetcher>,
    endpoint: Endpoint,
    settings: Arc<dyn SettingsStore>,
    cache: DetailCache,
    search_limiter: ConcurrencyLimiter,
    detail_limiter: ConcurrencyLimiter,
    config: ClientConfig,
}

/// Builder for [`CatalogClient`].
#[derive(Default)]
pub struct CatalogClientBuilder {
    fetcher: Option<Arc<dyn Fetcher>>,
    endpoint: Endpoint,
    settings: Option<Arc<dyn SettingsStore>>,
    cache: Option<DetailCache>,
    config: ClientConfig,
}

impl CatalogClientBuilder {
    /// Sets the transport. Defaults to an [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets how requests reach the upstream APIs.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the settings store consulted for the acceleration relay.
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets a detail cache, e.g. one shared with another client.
    pub fn cache(mut self, cache: DetailCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the tuning configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<CatalogClient> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::from_config(&self.config)?),
        };
        let cache = self
            .cache
            .unwrap_or_else(|| DetailCache::with_ttl(self.config.detail_cache_ttl()));

        Ok(CatalogClient {
            fetcher,
            endpoint: self.endpoint,
            settings: self
                .settings
                .unwrap_or_else(|| Arc::new(Settings::default())),
            cache,
            search_limiter: ConcurrencyLimiter::new(self.config.search_concurrency),
            detail_limiter: ConcurrencyLimiter::new(self.config.detail_concurrency),
            config: self.config,
        })
    }
}

impl CatalogClient {
    /// Returns a builder.
    pub fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::default()
    }

    /// Creates an HTTP client from a settings document.
    pub fn from_settings(settings: Settings, endpoint: Endpoint) -> Result<Self> {
        let config = settings.client.clone();
        Self::builder()
            .config(config)
            .endpoint(endpoint)
            .settings(Arc::new(settings))
            .build()
    }

    /// The detail cache.
    pub fn cache(&self) -> &DetailCache {
        &self.cache
    }

    /// The limiter shared by search fan-outs.
    pub fn search_limiter(&self) -> &ConcurrencyLimiter {
        &self.search_limiter
    }

    /// The limiter shared by detail and cover lookups.
    pub fn detail_limiter(&self) -> &ConcurrencyLimiter {
        &self.detail_limiter
    }

    /// The settings store.
    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    /// The tuning configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The acceleration relay to use for `source`, if any.
    ///
    /// TVBox sources and sources with `proxyEnabled: false` never use it.
    pub fn accel_relay_for(&self, source: &VideoSource) -> Option<String> {
        if source.is_tvbox() || source.proxy_enabled == Some(false) {
            return None;
        }
        self.settings
            .proxy_settings()
            .and_then(|proxy| proxy.active_url().map(str::to_string))
    }

    fn base_query(&self, source: &VideoSource) -> Result<ApiQuery> {
        if !source.has_api_url() {
            return Err(SearchError::MissingApiUrl(source.name.clone()));
        }
        Ok(ApiQuery::new(source.api_url.trim()).with_accel(self.accel_relay_for(source)))
    }

    async fn request(&self, source: &VideoSource, query: ApiQuery) -> Result<String> {
        let url = query.build(&self.endpoint)?;
        let policy = source.request_policy(self.config.retry_policy());
        let response = self.fetcher.fetch(&url, policy).await?;
        if !response.is_success() {
            return Err(SearchError::Status(response.status));
        }
        Ok(response.body)
    }

    /// Searches one source.
    ///
    /// Every returned item is stamped with the source's id and name.
    pub async fn search_videos(
        &self,
        source: &VideoSource,
        query: &str,
        page: u32,
    ) -> Result<SearchPage> {
        let mut request = self.base_query(source)?.with_keyword(query).with_page(page);
        if source.is_tvbox() {
            request = request.with_act("search");
        }

        let body = self.request(source, request).await?;
        let mut catalog = protocol::decode(source.source_type, &body, "search failed")?;
        catalog.stamp_source(&source.id, &source.name);
        debug!("Source {} returned {} results", source.name, catalog.list.len());
        Ok(catalog.into())
    }

    /// Searches every source and waits for the slowest.
    ///
    /// A failing source contributes nothing; lists are concatenated in
    /// source order and totals summed.
    pub async fn search_videos_all(
        &self,
        sources: &[VideoSource],
        query: &str,
        page: u32,
    ) -> Result<SearchPage> {
        if sources.is_empty() {
            return Err(SearchError::NoSources);
        }

        let searches = sources.iter().map(|source| {
            self.search_limiter.run(move || async move {
                match self.search_videos(source, query, page).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Source {} search failed: {}", source.name, e);
                        SearchPage::default()
                    }
                }
            })
        });
        let pages = join_all(searches).await;

        let total = pages.iter().map(|p| p.total).sum();
        let list = pages.into_iter().flat_map(|p| p.list).collect();
        Ok(SearchPage { list, total })
    }

    /// Fetches the detail record of one video.
    ///
    /// A cached record younger than the cache TTL is returned without any
    /// request. Otherwise the lookup goes through the detail limiter.
    pub async fn get_video_detail(&self, source: &VideoSource, video_id: &str) -> Result<VideoItem> {
        let request = self.base_query(source)?;

        if let Some(hit) = self.cache.get(&source.id, video_id).await {
            debug!("Detail cache hit for {}-{}", source.id, video_id);
            return Ok(hit);
        }

        self.detail_limiter
            .run(|| async {
                let request = if source.is_tvbox() {
                    request.with_act("detail").with_target(video_id)
                } else {
                    request.with_action("detail").with_ids(video_id)
                };
                let body = self.request(source, request).await?;
                let catalog =
                    protocol::decode(source.source_type, &body, "failed to fetch video detail")?;

                let mut detail = catalog
                    .list
                    .into_iter()
                    .next()
                    .ok_or_else(|| SearchError::Remote("video detail is empty".to_string()))?;
                detail.source_id = Some(source.id.clone());
                detail.source_name = Some(source.name.clone());

                self.cache.insert(&source.id, video_id, detail.clone()).await;
                Ok(detail)
            })
            .await
    }

    /// Loads a source's landing page: categories and, when the source
    /// sends them, a first page of videos.
    pub async fn home(&self, source: &VideoSource) -> Result<CatalogPage> {
        let request = if source.is_tvbox() {
            self.base_query(source)?.with_act("home")
        } else {
            self.base_query(source)?.with_action("list")
        };
        let body = self.request(source, request).await?;
        let mut catalog =
            protocol::decode(source.source_type, &body, "failed to load categories")?;
        catalog.stamp_source(&source.id, &source.name);
        Ok(catalog)
    }

    /// Lists a source's categories.
    pub async fn list_categories(&self, source: &VideoSource) -> Result<Vec<Category>> {
        Ok(self.home(source).await?.categories)
    }

    /// Browses a source, optionally within one category.
    ///
    /// `filters` only applies to TVBox sources, where it is sent as the
    /// `extend` JSON object.
    pub async fn list_videos(
        &self,
        source: &VideoSource,
        page: u32,
        category: Option<&str>,
        filters: &BTreeMap<String, String>,
    ) -> Result<CatalogPage> {
        let mut request = self.base_query(source)?.with_page(page);
        if source.is_tvbox() {
            request = match category {
                Some(category) => {
                    let request = request.with_act("category").with_target(category);
                    if filters.is_empty() {
                        request
                    } else {
                        request.with_extend(serde_json::to_string(filters)?)
                    }
                }
                None => request.with_act("home"),
            };
        } else if let Some(category) = category {
            request = request.with_target(category);
        }

        let body = self.request(source, request).await?;
        let mut catalog = protocol::decode(source.source_type, &body, "failed to load videos")?;
        catalog.stamp_source(&source.id, &source.name);
        Ok(catalog)
    }

    /// Resolves an episode URL to something playable.
    ///
    /// Normal sources already carry playable URLs. TVBox sources carry play
    /// ids that the crawler resolves with `act=play`.
    pub async fn resolve_play(
        &self,
        source: &VideoSource,
        play_id: &str,
        flag: Option<&str>,
    ) -> Result<PlayTarget> {
        if !source.is_tvbox() {
            return Ok(PlayTarget {
                url: play_id.to_string(),
                parse: false,
            });
        }

        let mut request = self.base_query(source)?.with_act("play").with_target(play_id);
        if let Some(flag) = flag {
            request = request.with_flag(flag);
        }
        let body = self.request(source, request).await?;
        protocol::decode_play(&body)
    }
}
