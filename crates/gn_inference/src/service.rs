use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use gn_core::categories::{self, display_name, NewsCategory};
use gn_core::{credibility, Error, NewsArticle, NewsResponse, Result, SearchOptions};
use gn_storage::{news_cache_key, TtlCache};

use crate::pipeline::reconcile::PLACEHOLDER_SOURCE;
use crate::pipeline::Orchestrator;

pub type NewsCache = TtlCache<NewsResponse>;

/// Cache-fronted access to the orchestrator.
#[derive(Debug)]
pub struct NewsService {
    orchestrator: Orchestrator,
    cache: Arc<NewsCache>,
    cache_fallback: bool,
}

impl NewsService {
    pub fn new(orchestrator: Orchestrator, cache: Arc<NewsCache>) -> Self {
        Self {
            orchestrator,
            cache,
            cache_fallback: false,
        }
    }

    /// Also cache responses assembled by the fallback chain.
    pub fn cache_fallback(mut self, enabled: bool) -> Self {
        self.cache_fallback = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<NewsCache> {
        &self.cache
    }

    pub fn model_name(&self) -> &str {
        self.orchestrator.model_name()
    }

    pub async fn fetch(&self, query: &str, category: &str, options: &SearchOptions) -> Result<NewsResponse> {
        let started = Instant::now();
        let key = news_cache_key(query, category, options);

        if let Some(mut hit) = self.cache.get(&key).await {
            tracing::info!("💾 Cache hit for key: {}", key);
            hit.cached = true;
            hit.search_time = started.elapsed().as_secs_f64();
            return Ok(hit);
        }
        tracing::info!("💾 Cache miss for key: {}", key);

        let response = self.orchestrator.run(query, category, options).await?;
        if !response.fallback_used || self.cache_fallback {
            self.cache.set(key, response.clone(), None).await;
        } else {
            tracing::debug!("Not caching fallback response for {}", category);
        }
        Ok(response)
    }

    /// Fetches every known category concurrently. A failing category degrades
    /// to a single placeholder article instead of failing the batch.
    pub async fn fetch_all(&self, options: &SearchOptions) -> BTreeMap<String, NewsResponse> {
        let tasks = categories::CATEGORIES.iter().map(|category| self.fetch_category(category, options));
        join_all(tasks).await.into_iter().collect()
    }

    async fn fetch_category(&self, category: &NewsCategory, options: &SearchOptions) -> (String, NewsResponse) {
        let started = Instant::now();
        let response = match self.fetch(category.primary_query(), category.id, options).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("⚠️ Failed to fetch {} news, using placeholder: {}", category.id, e);
                unavailable_response(category.id, &e, started.elapsed().as_secs_f64())
            }
        };
        (category.id.to_string(), response)
    }

    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.clear().await;
        tracing::info!("🗑️ News cache cleared ({} entries)", removed);
        removed
    }
}

/// Stand-in response for a category whose pipeline failed.
pub fn unavailable_response(category: &str, error: &Error, search_time: f64) -> NewsResponse {
    let now = Utc::now();
    let sources = vec![PLACEHOLDER_SOURCE.to_string()];
    let note = if error.is_upstream() {
        "The news provider is temporarily unavailable."
    } else {
        "News could not be generated for this category."
    };
    let article = NewsArticle {
        id: format!("{}-{}-0", category, now.timestamp_millis()),
        title: format!("Latest {} News", display_name(category)),
        summary: format!("{} Please try again shortly.", note),
        content: format!("{} Fresh {} coverage will appear once it recovers.", note, category),
        category: category.to_string(),
        credibility_score: credibility::score(&sources),
        sources,
        source_urls: vec![String::new()],
        fact_check: "Not verified".to_string(),
        timestamp: now,
        importance_score: None,
    };
    NewsResponse {
        articles: vec![article],
        category: category.to_string(),
        cached: false,
        search_time,
        timestamp: now,
        citations_count: 0,
        fallback_used: true,
    }
}
