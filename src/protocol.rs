//! Response decoding for the two catalog protocol families.

use serde::Deserialize;
use serde_json::Value;

use crate::result::{ApiResponse, CatalogPage, PlayTarget, VideoItem, SUCCESS_CODE};
use crate::source::SourceType;
use crate::{Result, SearchError};

/// A TVBox body, which comes in several shapes.
#[derive(Debug)]
enum TvboxBody {
    /// `{"error": ...}` from the crawler or the relay.
    Failure(String),
    /// A bare array of items.
    Items(Vec<VideoItem>),
    /// The usual envelope.
    Envelope(ApiResponse),
}

impl TvboxBody {
    fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        match value {
            Value::Array(_) => Ok(TvboxBody::Items(serde_json::from_value(value)?)),
            Value::Object(ref map) if map.contains_key("error") => {
                let message = map
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("API returned an error")
                    .to_string();
                Ok(TvboxBody::Failure(message))
            }
            Value::Object(_) => Ok(TvboxBody::Envelope(serde_json::from_value(value)?)),
            other => Err(SearchError::Parse(format!(
                "unexpected TVBox response: {}",
                other
            ))),
        }
    }
}

fn non_negative(value: Option<i64>) -> Option<u64> {
    value.map(|v| v.max(0) as u64)
}

fn from_envelope(response: ApiResponse) -> CatalogPage {
    CatalogPage {
        list: response.list.unwrap_or_default(),
        total: non_negative(response.total).unwrap_or(0),
        page: non_negative(response.page).unwrap_or(1),
        page_count: non_negative(response.pagecount).unwrap_or(0),
        categories: response.class.unwrap_or_default(),
        filters: response.filters,
    }
}

/// Decodes a normal-protocol body.
///
/// Anything other than `code == 1` is a remote failure carrying the remote
/// `msg`, or `fallback` when there is none.
pub fn decode_normal(body: &str, fallback: &str) -> Result<CatalogPage> {
    let response: ApiResponse = serde_json::from_str(body)?;
    if response.code != Some(SUCCESS_CODE) {
        let message = response
            .msg
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(SearchError::Remote(message));
    }
    Ok(from_envelope(response))
}

/// Decodes a TVBox-protocol body.
pub fn decode_tvbox(body: &str) -> Result<CatalogPage> {
    match TvboxBody::parse(body)? {
        TvboxBody::Failure(message) => Err(SearchError::Remote(message)),
        TvboxBody::Items(list) => Ok(CatalogPage {
            total: list.len() as u64,
            page: 1,
            page_count: 1,
            list,
            ..Default::default()
        }),
        TvboxBody::Envelope(response) => Ok(from_envelope(response)),
    }
}

/// Decodes a body according to the source's protocol family.
pub fn decode(source_type: SourceType, body: &str, fallback: &str) -> Result<CatalogPage> {
    match source_type {
        SourceType::Normal => decode_normal(body, fallback),
        SourceType::Tvbox => decode_tvbox(body),
    }
}

#[derive(Deserialize)]
struct PlayResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    parse: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Decodes a TVBox `act=play` body into a play target.
pub fn decode_play(body: &str) -> Result<PlayTarget> {
    let response: PlayResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error.filter(|e| !e.is_empty()) {
        return Err(SearchError::Remote(error));
    }
    let url = response
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| SearchError::Remote("play URL is empty".to_string()))?;
    let parse = match response.parse {
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => s.trim() == "1",
        Some(Value::Bool(b)) => b,
        _ => false,
    };
    Ok(PlayTarget { url, parse })
}
