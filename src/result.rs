//! Catalog item and response types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Status code a normal catalog API returns on success.
pub const SUCCESS_CODE: i64 = 1;

/// A video record returned by a catalog API.
///
/// Remote APIs disagree on scalar types, so identifiers and text fields
/// accept numbers or strings and are kept as strings. Fields this type does
/// not name are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub vod_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub vod_name: String,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_en: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_remarks: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_play_from: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_pic: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_play_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_pic_thumb: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_actor: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_director: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_writer: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_blurb: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_pubdate: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_area: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_lang: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_year: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_score: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub vod_content: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Id of the source this item came from, stamped by the client.
    #[serde(rename = "sourceId", default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Name of the source this item came from, stamped by the client.
    #[serde(rename = "sourceName", default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Fields not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A detail record is a summary record with its playable fields filled in.
pub type VideoDetail = VideoItem;

impl VideoItem {
    /// Creates an item with only an id and a name.
    pub fn new(vod_id: impl Into<String>, vod_name: impl Into<String>) -> Self {
        Self {
            vod_id: vod_id.into(),
            vod_name: vod_name.into(),
            ..Default::default()
        }
    }

    /// Sets the cover image.
    pub fn with_pic(mut self, pic: impl Into<String>) -> Self {
        self.vod_pic = Some(pic.into());
        self
    }

    /// Sets the encoded playlist.
    pub fn with_play_url(mut self, play_url: impl Into<String>) -> Self {
        self.vod_play_url = Some(play_url.into());
        self
    }

    /// Stamps the originating source.
    pub fn with_source(mut self, source_id: impl Into<String>, source_name: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self.source_name = Some(source_name.into());
        self
    }

    /// Identity of the item across all sources: `(source_id, vod_id)`.
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.source_id.clone().unwrap_or_default(),
            self.vod_id.clone(),
        )
    }

    /// Returns the cover URL if it is non-empty.
    pub fn cover(&self) -> Option<&str> {
        self.vod_pic
            .as_deref()
            .map(str::trim)
            .filter(|pic| !pic.is_empty())
    }

    /// Returns whether the item carries a usable cover URL.
    pub fn has_cover(&self) -> bool {
        self.cover().is_some()
    }
}

/// A category entry from a response's `class` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "lenient::string")]
    pub type_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub type_name: String,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub type_pid: Option<String>,
}

/// Raw response envelope shared by both protocol families.
///
/// Normal sources always set `code`; TVBox sources may omit it and may set
/// `error` or `filters` instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub msg: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub pagecount: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total: Option<i64>,
    #[serde(default)]
    pub list: Option<Vec<VideoItem>>,
    #[serde(default)]
    pub class: Option<Vec<Category>>,
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub error: Option<String>,
}

/// Result of a single-source keyword search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub list: Vec<VideoItem>,
    pub total: u64,
}

/// A decoded, successful catalog response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub list: Vec<VideoItem>,
    pub total: u64,
    pub page: u64,
    pub page_count: u64,
    pub categories: Vec<Category>,
    /// TVBox filter definitions keyed by category id, passed through as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
}

impl CatalogPage {
    /// Stamps every item with the originating source.
    pub fn stamp_source(&mut self, source_id: &str, source_name: &str) {
        for item in &mut self.list {
            item.source_id = Some(source_id.to_string());
            item.source_name = Some(source_name.to_string());
        }
    }
}

impl From<CatalogPage> for SearchPage {
    fn from(page: CatalogPage) -> Self {
        Self {
            list: page.list,
            total: page.total,
        }
    }
}

/// Where a TVBox play id resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTarget {
    pub url: String,
    /// The URL is a web page to embed rather than a media stream.
    pub parse: bool,
}

/// Deserializers tolerating the loose typing of catalog APIs.
mod lenient {
    use super::*;

    fn scalar_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(scalar_to_string(Value::deserialize(de)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_to_string(Value::deserialize(de)?))
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }
}
