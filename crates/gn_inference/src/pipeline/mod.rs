use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use gn_core::{
    credibility, Completion, CompletionRequest, Error, InferenceModel, NewsArticle, NewsResponse, Result,
    SearchOptions, SourceRef, Stage, WebSearchOptions,
};

pub mod extract;
pub mod prompts;
pub mod reconcile;

use extract::{ArticleDraft, Extractor};

pub const DEFAULT_FACT_CHECK: &str = "Verified through web search";

/// Three sequential model calls: discovery (with web search), analysis, and
/// structuring into JSON. Holds no state between runs.
pub struct Orchestrator {
    model: Arc<dyn InferenceModel>,
    extractor: Extractor,
    stage_timeout: Duration,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("model", &self.model.name())
            .field("stage_timeout", &self.stage_timeout)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(model: Arc<dyn InferenceModel>, stage_timeout: Duration) -> Self {
        Self {
            model,
            extractor: Extractor::default(),
            stage_timeout,
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Runs one stage under the timeout budget. Empty text counts as failure.
    async fn call(&self, request: CompletionRequest) -> Result<Completion> {
        let stage = request.stage;
        let completion = tokio::time::timeout(self.stage_timeout, self.model.complete(request))
            .await
            .map_err(|_| Error::Timeout { stage })??;
        if completion.content.trim().is_empty() {
            return Err(Error::NoContent { stage });
        }
        tracing::debug!(
            "{} stage returned {} chars, {} citations",
            stage,
            completion.content.len(),
            completion.citations.len()
        );
        Ok(completion)
    }

    pub async fn run(&self, query: &str, category: &str, options: &SearchOptions) -> Result<NewsResponse> {
        options.validate()?;
        let started = Instant::now();
        let max_articles = options.max_articles();

        let web_search = WebSearchOptions {
            search_context_size: options.search_context_size,
            user_location: options.location.as_ref().and_then(|l| l.for_search()),
        };
        let discovery = self
            .call(
                CompletionRequest::new(Stage::Discovery, prompts::discovery(query, max_articles))
                    .with_web_search(web_search),
            )
            .await
            .map_err(|e| {
                tracing::error!("🔍 Discovery failed for '{}': {}", query, e);
                e
            })?;
        let sources = reconcile::unique_sources(&discovery.citations);
        tracing::info!(
            "🔍 Discovery for '{}' returned {} citations ({} unique sources)",
            query,
            discovery.citations.len(),
            sources.len()
        );

        let analysis = self
            .call(CompletionRequest::new(
                Stage::Analysis,
                prompts::analysis(query, &discovery.content, &sources, max_articles),
            ))
            .await
            .map_err(|e| {
                tracing::error!("📊 Analysis failed for '{}': {}", query, e);
                e
            })?;

        // Structuring failures are absorbed by the fallback chain
        let structured = match self
            .call(CompletionRequest::new(
                Stage::Structuring,
                prompts::structuring(query, &analysis.content, &sources, max_articles),
            ))
            .await
        {
            Ok(completion) => completion.content,
            Err(e) => {
                tracing::warn!("⚠️ Structuring failed for '{}', using fallback: {}", query, e);
                String::new()
            }
        };

        let extraction = self
            .extractor
            .extract(&structured, &analysis.content, category, max_articles);
        let now = Utc::now();
        let articles: Vec<NewsArticle> = extraction
            .drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| build_article(draft, index, &sources, category, now))
            .collect();

        if articles.is_empty() {
            return Err(Error::EmptyResult);
        }

        tracing::info!(
            "📰 Built {} {} articles via {} in {:.2}s",
            articles.len(),
            category,
            extraction.strategy,
            started.elapsed().as_secs_f64()
        );

        Ok(NewsResponse {
            articles,
            category: category.to_string(),
            cached: false,
            search_time: started.elapsed().as_secs_f64(),
            timestamp: now,
            citations_count: discovery.citations.len(),
            fallback_used: extraction.fallback_used,
        })
    }
}

/// Normalizes one draft into an article, filling placeholders and assigning
/// its primary source.
pub fn build_article(
    draft: ArticleDraft,
    index: usize,
    sources: &[SourceRef],
    category: &str,
    timestamp: DateTime<Utc>,
) -> NewsArticle {
    let source = reconcile::primary_source(
        draft.source_title.as_deref(),
        draft.source_url.as_deref(),
        sources,
        index,
    );
    let names = vec![source.title];
    NewsArticle {
        id: format!("{}-{}-{}", category, timestamp.timestamp_millis(), index),
        title: draft
            .headline
            .unwrap_or_else(|| format!("{} News Update {}", category, index + 1)),
        summary: draft.summary.unwrap_or_else(|| "Summary not available".to_string()),
        content: draft.content.unwrap_or_else(|| "Content not available".to_string()),
        category: category.to_string(),
        credibility_score: credibility::score(&names),
        sources: names,
        source_urls: vec![source.url],
        fact_check: draft
            .verification_status
            .unwrap_or_else(|| DEFAULT_FACT_CHECK.to_string()),
        timestamp,
        importance_score: draft.importance_score.map(|s| s.round().clamp(1.0, 10.0) as u8),
    }
}
