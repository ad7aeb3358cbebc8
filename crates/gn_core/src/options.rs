use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

pub const MIN_ARTICLES: u8 = 1;
pub const MAX_ARTICLES: u8 = 10;
pub const DEFAULT_MAX_ARTICLES: u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    #[default]
    Medium,
    High,
}

impl SearchContextSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchContextSize::Low => "low",
            SearchContextSize::Medium => "medium",
            SearchContextSize::High => "high",
        }
    }
}

impl fmt::Display for SearchContextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchContextSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(SearchContextSize::Low),
            "medium" => Ok(SearchContextSize::Medium),
            "high" => Ok(SearchContextSize::High),
            _ => Err(Error::validation(
                "INVALID_SEARCH_CONTEXT",
                "searchContextSize must be one of: low, medium, high",
            )),
        }
    }
}

/// Approximate user location forwarded to web search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Location {
    /// True when none of the fields used by web search carry a value.
    pub fn is_empty(&self) -> bool {
        [&self.country, &self.city, &self.region]
            .iter()
            .all(|field| field.as_deref().map_or(true, |v| v.trim().is_empty()))
    }

    /// Copy limited to the fields the search provider understands.
    pub fn for_search(&self) -> Option<Location> {
        if self.is_empty() {
            return None;
        }
        let keep = |field: &Option<String>| field.clone().filter(|v| !v.trim().is_empty());
        Some(Location {
            country: keep(&self.country),
            city: keep(&self.city),
            region: keep(&self.region),
            timezone: None,
        })
    }
}

/// Validated per-request options controlling the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub search_context_size: SearchContextSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub max_articles: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_context_size: SearchContextSize::default(),
            location: None,
            max_articles: DEFAULT_MAX_ARTICLES,
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<()> {
        validate_max_articles(i64::from(self.max_articles)).map(|_| ())
    }

    pub fn max_articles(&self) -> usize {
        usize::from(self.max_articles)
    }
}

pub fn validate_max_articles(value: i64) -> Result<u8> {
    if value < i64::from(MIN_ARTICLES) || value > i64::from(MAX_ARTICLES) {
        return Err(Error::validation(
            "INVALID_MAX_ARTICLES",
            format!("maxArticles must be a number between {MIN_ARTICLES} and {MAX_ARTICLES}"),
        ));
    }
    Ok(value as u8)
}

/// Accepts any JSON number with no fractional part, so `3` and `3.0` agree.
pub fn max_articles_from_json(value: &Value) -> Result<u8> {
    let count = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| {
            Error::validation(
                "INVALID_MAX_ARTICLES",
                format!("maxArticles must be a whole number between {MIN_ARTICLES} and {MAX_ARTICLES}"),
            )
        })?;
    validate_max_articles(count)
}

/// Process-wide defaults a client may adjust; any change invalidates the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    pub search_context_size: SearchContextSize,
    pub location: Location,
    pub enable_citations: bool,
    pub max_articles: u8,
    pub language: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            search_context_size: SearchContextSize::Medium,
            location: Location {
                country: Some("IN".to_string()),
                city: Some("Pune".to_string()),
                region: Some("Maharashtra".to_string()),
                timezone: Some("Asia/Kolkata".to_string()),
            },
            enable_citations: true,
            max_articles: DEFAULT_MAX_ARTICLES,
            language: "en".to_string(),
        }
    }
}

/// Partial settings update, merged field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub search_context_size: Option<SearchContextSize>,
    pub location: Option<Location>,
    pub enable_citations: Option<bool>,
    pub max_articles: Option<Value>,
    pub language: Option<String>,
}

impl SearchSettings {
    pub fn apply(&mut self, patch: SettingsPatch) -> Result<()> {
        let max_articles = patch.max_articles.as_ref().map(max_articles_from_json).transpose()?;
        if let Some(size) = patch.search_context_size {
            self.search_context_size = size;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(enable) = patch.enable_citations {
            self.enable_citations = enable;
        }
        if let Some(max) = max_articles {
            self.max_articles = max;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        Ok(())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            search_context_size: self.search_context_size,
            location: Some(self.location.clone()).filter(|l| !l.is_empty()),
            max_articles: self.max_articles,
        }
    }
}
