//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::client::CatalogClient;
use crate::fetch::{FetchResponse, Fetcher, RetryPolicy};
use crate::query::Endpoint;
use crate::settings::Settings;
use crate::{Result, SearchError};

pub(crate) const API_A: &str = "http://a.example/api.php/provide/vod";
pub(crate) const API_B: &str = "http://b.example/api.php/provide/vod";
pub(crate) const API_C: &str = "http://c.example/api.php/provide/vod";

/// A canned reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body {
        status: u16,
        body: String,
        delay: Duration,
    },
    /// Transport failure after the delay.
    Fail(Duration),
    /// Never settles.
    Hang,
}

impl Reply {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Reply::Body {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Body {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn delayed(delay: Duration, body: impl Into<String>) -> Self {
        Reply::Body {
            status: 200,
            body: body.into(),
            delay,
        }
    }
}

/// A requested URL.
#[derive(Debug, Clone)]
pub(crate) struct Requested(Url);

impl Requested {
    pub(crate) fn query_param(&self, name: &str) -> Option<String> {
        self.0
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

struct Route {
    api_url: String,
    param: Option<(String, String)>,
    reply: Reply,
}

/// Fetcher that answers relay-style requests by their `apiUrl` parameter.
///
/// Clones share routes and call records.
#[derive(Clone, Default)]
pub(crate) struct MockFetcher {
    routes: Arc<Mutex<Vec<Route>>>,
    requested: Arc<Mutex<Vec<Url>>>,
    calls: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers every request for `api_url`.
    pub(crate) fn on(self, api_url: &str, reply: Reply) -> Self {
        self.push(api_url, None, reply)
    }

    /// Answers requests for `api_url` carrying `name=value`. Checked before
    /// routes registered later.
    pub(crate) fn on_param(self, api_url: &str, name: &str, value: &str, reply: Reply) -> Self {
        self.push(api_url, Some((name.to_string(), value.to_string())), reply)
    }

    fn push(self, api_url: &str, param: Option<(String, String)>, reply: Reply) -> Self {
        self.routes.lock().unwrap().push(Route {
            api_url: api_url.to_string(),
            param,
            reply,
        });
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_for(&self, api_url: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|url| Requested((*url).clone()).query_param("apiUrl").as_deref() == Some(api_url))
            .count()
    }

    pub(crate) fn last_url(&self) -> Option<Requested> {
        self.requested.lock().unwrap().last().cloned().map(Requested)
    }

    fn reply_for(&self, url: &Url) -> Option<Reply> {
        let requested = Requested(url.clone());
        let api_url = requested.query_param("apiUrl")?;
        self.routes
            .lock()
            .unwrap()
            .iter()
            .find(|route| {
                route.api_url == api_url
                    && route.param.as_ref().map_or(true, |(name, value)| {
                        requested.query_param(name).as_deref() == Some(value.as_str())
                    })
            })
            .map(|route| route.reply.clone())
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _policy: RetryPolicy) -> Result<FetchResponse> {
        let url = Url::parse(url)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.clone());

        match self.reply_for(&url) {
            Some(Reply::Body { status, body, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(FetchResponse::new(status, body))
            }
            Some(Reply::Fail(delay)) => {
                tokio::time::sleep(delay).await;
                Err(SearchError::Transport("connection refused".to_string()))
            }
            Some(Reply::Hang) => futures::future::pending::<Result<FetchResponse>>().await,
            None => Ok(FetchResponse::new(404, r#"{"error":"no route"}"#)),
        }
    }
}

/// A successful normal-protocol body listing `(vod_id, vod_name)` pairs.
pub(crate) fn list_body(items: &[(&str, &str)]) -> String {
    let list: Vec<_> = items
        .iter()
        .map(|(id, name)| json!({ "vod_id": id, "vod_name": name }))
        .collect();
    json!({
        "code": 1,
        "msg": "数据列表",
        "page": 1,
        "pagecount": 1,
        "total": items.len(),
        "list": list,
    })
    .to_string()
}

/// A client that routes through a relay so `fetcher` can match on `apiUrl`.
pub(crate) fn relay_client(fetcher: MockFetcher, settings: Settings) -> CatalogClient {
    let config = settings.client.clone();
    CatalogClient::builder()
        .fetcher(Arc::new(fetcher))
        .endpoint(Endpoint::Relay(Url::parse("http://relay.test").unwrap()))
        .settings(Arc::new(settings))
        .config(config)
        .build()
        .unwrap()
}
