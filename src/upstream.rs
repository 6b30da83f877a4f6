//! Client for the upstream video-search service.
//!
//! The upstream is best-effort and unversioned: records may be missing any
//! field or carry the wrong type, so the envelope keeps raw records as JSON
//! values and a record is only typed (leniently) when it is normalized.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::constants::{SEARCH_API_URL, USER_AGENT};

/// Sort keys the upstream understands. Anything else passes through to the
/// upstream verbatim, which may reject it on its own terms.
pub const ORDER_KEYS: [&str; 5] = [
    "latest",
    "top-weekly",
    "top-monthly",
    "top-rated",
    "most-popular",
];

/// Default sort order for plain searches
pub const DEFAULT_ORDER: &str = "latest";

#[derive(Clone)]
pub struct SearchClient {
    http: Client,
}

impl SearchClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch a single page of search results.
    ///
    /// One attempt only: a failure here is final for the page, retry policy
    /// lives nowhere in this service.
    pub async fn search(
        &self,
        term: &str,
        page: u32,
        order: &str,
        per_page: u32,
    ) -> Result<SearchPage, SearchError> {
        let per_page = per_page.to_string();
        let page = page.to_string();
        let params = [
            ("query", term),
            ("per_page", per_page.as_str()),
            ("page", page.as_str()),
            ("order", order),
            ("thumbsize", "big"),
            ("format", "json"),
        ];

        let resp = self
            .http
            .get(SEARCH_API_URL)
            .query(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SearchError::Status(resp.status().as_u16()));
        }

        let body: SearchPage = resp.json().await.map_err(SearchError::Decode)?;
        Ok(body)
    }
}

/// Upstream response envelope. Both fields default when absent so a partial
/// body still decodes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub videos: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: u64,
}

/// Lenient view of a single upstream record. Fields that upstream sends with
/// inconsistent types (numbers vs strings, 0/1 vs bool) stay as raw values
/// and are coerced during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVideo {
    pub id: Option<serde_json::Value>,
    pub title: String,
    pub keywords: String,
    pub views: Option<serde_json::Value>,
    pub rate: Option<serde_json::Value>,
    pub added: String,
    pub length_min: Option<serde_json::Value>,
    pub embed: String,
    pub default_thumb: Thumb,
    pub is_vr: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thumb {
    pub src: String,
}

#[derive(Debug)]
pub enum SearchError {
    Http(reqwest::Error),
    Status(u16),
    Decode(reqwest::Error),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Http(e)
    }
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Http(e) => write!(f, "HTTP error: {}", e),
            SearchError::Status(code) => write!(f, "upstream returned status {}", code),
            SearchError::Decode(e) => write!(f, "malformed upstream body: {}", e),
        }
    }
}

impl std::error::Error for SearchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_decodes_full_envelope() {
        let body = r#"{"videos": [{"id": 1}, {"id": 2}], "total_count": 912}"#;
        let page: SearchPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.videos.len(), 2);
        assert_eq!(page.total_count, 912);
    }

    #[test]
    fn test_search_page_tolerates_missing_fields() {
        let page: SearchPage = serde_json::from_str("{}").unwrap();
        assert!(page.videos.is_empty());
        assert_eq!(page.total_count, 0);

        let page: SearchPage = serde_json::from_str(r#"{"total_count": 7}"#).unwrap();
        assert_eq!(page.total_count, 7);
    }

    #[test]
    fn test_raw_video_keeps_mixed_type_fields() {
        let value = serde_json::json!({
            "id": "12345",
            "title": "A title",
            "rate": "4.52",
            "length_min": 18,
            "is_vr": 0,
            "default_thumb": {"src": "https://cdn.example/t.jpg", "width": 640}
        });
        let raw: RawVideo = serde_json::from_value(value).unwrap();
        assert_eq!(raw.id, Some(serde_json::json!("12345")));
        assert_eq!(raw.rate, Some(serde_json::json!("4.52")));
        assert_eq!(raw.default_thumb.src, "https://cdn.example/t.jpg");
        assert!(raw.embed.is_empty());
    }
}
