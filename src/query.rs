//! Catalog request construction.
//!
//! A request is either sent to the proxy relay, which re-attaches the
//! parameters to `apiUrl` server-side, or built directly against the
//! upstream API.

use url::Url;

use crate::Result;

/// Path of the proxy relay route.
pub const RELAY_PATH: &str = "/api/proxy";

/// How catalog requests reach the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Through the proxy relay hosted at the given origin.
    Relay(Url),
    /// Straight to the upstream API.
    Direct,
}

impl Endpoint {
    /// Creates a relay endpoint from its origin.
    pub fn relay(origin: &str) -> Result<Self> {
        Ok(Endpoint::Relay(Url::parse(origin)?))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Direct
    }
}

/// Parameters of one catalog request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiQuery {
    /// Upstream API base URL.
    pub api_url: String,
    /// Search keyword (`wd`).
    pub keyword: Option<String>,
    /// Page number (`pg`), 1-indexed.
    pub page: Option<u32>,
    /// Normal-protocol action (`ac`), e.g. `detail` or `list`.
    pub action: Option<String>,
    /// Comma-separated video ids (`ids`).
    pub ids: Option<String>,
    /// Category id or TVBox target id (`t`).
    pub target: Option<String>,
    /// TVBox action (`act`).
    pub act: Option<String>,
    /// TVBox filter JSON (`extend`).
    pub extend: Option<String>,
    /// TVBox play flag (`flag`).
    pub flag: Option<String>,
    /// Acceleration relay URL (`proxyUrl`).
    pub accel_url: Option<String>,
}

impl ApiQuery {
    /// Creates a query against the given API.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Sets the search keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Sets the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the normal-protocol action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the video ids.
    pub fn with_ids(mut self, ids: impl Into<String>) -> Self {
        self.ids = Some(ids.into());
        self
    }

    /// Sets the category or target id.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the TVBox action.
    pub fn with_act(mut self, act: impl Into<String>) -> Self {
        self.act = Some(act.into());
        self
    }

    /// Sets the TVBox filter JSON.
    pub fn with_extend(mut self, extend: impl Into<String>) -> Self {
        self.extend = Some(extend.into());
        self
    }

    /// Sets the TVBox play flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Sets or clears the acceleration relay.
    pub fn with_accel(mut self, accel_url: Option<String>) -> Self {
        self.accel_url = accel_url;
        self
    }

    /// Upstream parameters in wire order. Empty values are dropped.
    fn params(&self) -> Vec<(&'static str, String)> {
        let page = self.page.map(|p| p.to_string());
        [
            ("wd", self.keyword.as_ref()),
            ("pg", page.as_ref()),
            ("ac", self.action.as_ref()),
            ("ids", self.ids.as_ref()),
            ("t", self.target.as_ref()),
            ("act", self.act.as_ref()),
            ("extend", self.extend.as_ref()),
            ("flag", self.flag.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v.clone())))
        .collect()
    }

    /// Builds the relay request URL under `origin`.
    pub fn relay_url(&self, origin: &Url) -> Result<Url> {
        let mut url = origin.join(RELAY_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apiUrl", &self.api_url);
            for (name, value) in self.params() {
                pairs.append_pair(name, &value);
            }
            if let Some(accel) = &self.accel_url {
                pairs.append_pair("proxyUrl", accel);
            }
        }
        Ok(url)
    }

    /// Builds the upstream URL the relay would forward to.
    ///
    /// Parameters replace same-named ones already present in `api_url`.
    /// With an acceleration relay the result is
    /// `{accel}/?url=<encoded upstream>`.
    pub fn upstream_url(&self) -> Result<String> {
        let mut url = Url::parse(self.api_url.trim())?;
        let params = self.params();

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !params.iter().any(|(p, _)| p == name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        url.set_query(None);
        if !kept.is_empty() || !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(kept);
            for (name, value) in &params {
                pairs.append_pair(name, value);
            }
        }

        let target = url.to_string();
        Ok(match &self.accel_url {
            Some(accel) => format!(
                "{}/?url={}",
                accel.trim_end_matches('/'),
                urlencoding::encode(&target)
            ),
            None => target,
        })
    }

    /// Builds the URL to fetch for the given endpoint.
    pub fn build(&self, endpoint: &Endpoint) -> Result<String> {
        match endpoint {
            Endpoint::Relay(origin) => Ok(self.relay_url(origin)?.to_string()),
            Endpoint::Direct => self.upstream_url(),
        }
    }
}
