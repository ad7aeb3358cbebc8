use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on `sources`/`sourceUrls` entries per article.
pub const MAX_SOURCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    /// Parallel to `source_urls`.
    pub sources: Vec<String>,
    pub source_urls: Vec<String>,
    pub credibility_score: u8,
    pub fact_check: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub articles: Vec<NewsArticle>,
    pub category: String,
    pub cached: bool,
    /// Seconds spent producing this response.
    pub search_time: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "citations")]
    pub citations_count: usize,
    #[serde(default)]
    pub fallback_used: bool,
}

/// A `url_citation` annotation pointing into the discovery text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
}

/// A source as attached to an article: display title plus URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

impl SourceRef {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}
