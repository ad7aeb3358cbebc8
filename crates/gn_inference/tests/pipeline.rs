use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gn_core::{
    Citation, Completion, CompletionRequest, Error, InferenceModel, Location, SearchContextSize, SearchOptions, Stage,
};
use gn_inference::models::{DummyModel, ScriptedModel};
use gn_inference::{NewsService, Orchestrator};
use gn_storage::TtlCache;

const ANALYSIS: &str = "1. Senate committee advances federal AI oversight bill\n\
    The bill would create a licensing regime for frontier model developers and require incident reporting \
    within seventy-two hours of discovery.\n\n\
    2. EU regulators open consultation on general-purpose AI code\n\
    The consultation invites comments on transparency and copyright obligations ahead of the August deadline \
    for providers of general-purpose models.";

const STRUCTURED: &str = r#"[
  {"headline": "Senate committee advances AI bill", "summary": "s1", "content": "c1", "importanceScore": 8,
   "sourceTitle": "Reuters Technology", "sourceUrl": "https://reuters.com/tech/ai-bill", "verificationStatus": "Verified"},
  {"headline": "EU opens AI code consultation", "summary": "s2", "content": "c2", "importanceScore": 7,
   "sourceTitle": "", "sourceUrl": "n/a"}
]"#;

fn citations() -> Vec<Citation> {
    vec![
        Citation {
            url: "https://reuters.com/tech/ai-bill".to_string(),
            title: "Reuters Technology".to_string(),
            start_index: 0,
            end_index: 40,
        },
        Citation {
            url: "https://politico.eu/ai-code".to_string(),
            title: "Politico Europe".to_string(),
            start_index: 41,
            end_index: 90,
        },
    ]
}

fn discovery() -> Completion {
    Completion {
        content: "Lawmakers in the US and EU moved on AI rules this week.".to_string(),
        citations: citations(),
    }
}

fn options(max_articles: u8) -> SearchOptions {
    SearchOptions {
        max_articles,
        ..Default::default()
    }
}

fn orchestrator(model: Arc<ScriptedModel>) -> Orchestrator {
    Orchestrator::new(model, Duration::from_secs(30))
}

#[tokio::test]
async fn test_well_formed_pipeline() {
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_text(STRUCTURED),
    );
    let response = orchestrator(model.clone())
        .run("AI regulation", "technology", &options(2))
        .await
        .unwrap();

    assert!(!response.fallback_used);
    assert!(!response.cached);
    assert_eq!(response.citations_count, 2);
    assert_eq!(response.articles.len(), 2);

    let first = &response.articles[0];
    assert_eq!(first.title, "Senate committee advances AI bill");
    assert_eq!(first.source_urls, vec!["https://reuters.com/tech/ai-bill".to_string()]);
    assert_eq!(first.credibility_score, 7);
    assert_eq!(first.importance_score, Some(8));

    // Invalid proposal falls back to the cyclic candidate
    let second = &response.articles[1];
    assert_eq!(second.source_urls, vec!["https://politico.eu/ai-code".to_string()]);
    assert_eq!(second.sources, vec!["Politico Europe".to_string()]);
    assert_ne!(first.id, second.id);

    let calls = model.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].stage, Stage::Discovery);
    assert!(calls[0].web_search.is_some());
    assert!(calls[1].web_search.is_none());
    assert!(calls[1].prompt.contains("Lawmakers in the US and EU"));
    assert!(calls[2].prompt.contains("Senate committee advances federal AI oversight bill"));
    assert!(calls[2].prompt.contains("URL: https://politico.eu/ai-code"));
}

#[tokio::test]
async fn test_malformed_structuring_uses_fallback() {
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_text("I'm sorry, here are the articles: {headline: broken"),
    );
    let response = orchestrator(model)
        .run("AI regulation", "technology", &options(2))
        .await
        .unwrap();

    let urls: Vec<String> = citations().into_iter().map(|c| c.url).collect();
    assert!(response.fallback_used);
    assert!(!response.articles.is_empty() && response.articles.len() <= 2);
    for article in &response.articles {
        assert!(urls.contains(&article.source_urls[0]), "unexpected url {:?}", article.source_urls);
    }
}

#[tokio::test]
async fn test_cyclic_sources_for_five_articles() {
    let structured = serde_json::to_string(
        &(0..5)
            .map(|i| serde_json::json!({ "headline": format!("Story {}", i), "sourceUrl": "unknown" }))
            .collect::<Vec<_>>(),
    )
    .unwrap();
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_text(structured),
    );
    let response = orchestrator(model).run("AI", "technology", &options(5)).await.unwrap();

    let urls: Vec<String> = citations().into_iter().map(|c| c.url).collect();
    let assigned: Vec<usize> = response
        .articles
        .iter()
        .map(|a| urls.iter().position(|u| u == &a.source_urls[0]).unwrap())
        .collect();
    assert_eq!(assigned, vec![0, 1, 0, 1, 0]);
}

#[tokio::test]
async fn test_structuring_error_is_absorbed() {
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_fail(Error::from_status(500, "overloaded")),
    );
    let response = orchestrator(model).run("AI", "technology", &options(3)).await.unwrap();
    assert!(response.fallback_used);
    assert_eq!(response.articles.len(), 2);
}

#[tokio::test]
async fn test_empty_discovery_is_fatal() {
    let model = Arc::new(ScriptedModel::new().then_text("   "));
    let err = orchestrator(model.clone())
        .run("AI", "technology", &options(3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoContent { stage: Stage::Discovery }));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_analysis_status_errors_propagate() {
    for status in [401u16, 429, 502] {
        let model = Arc::new(
            ScriptedModel::new()
                .then_reply(discovery())
                .then_fail(Error::from_status(status, "upstream")),
        );
        let err = orchestrator(model)
            .run("AI", "technology", &options(3))
            .await
            .unwrap_err();
        let mapped = match status {
            401 => matches!(err, Error::UpstreamAuth(_)),
            429 => matches!(err, Error::UpstreamRateLimit(_)),
            _ => matches!(err, Error::UpstreamService(_)),
        };
        assert!(mapped, "status {} mapped to {:?}", status, err);
    }
}

#[tokio::test(start_paused = true)]
async fn test_stage_timeout() {
    let model = Arc::new(ScriptedModel::new().then_reply(discovery()).then_hang());
    let err = Orchestrator::new(model, Duration::from_secs(5))
        .run("AI", "technology", &options(3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { stage: Stage::Analysis }));
}

#[tokio::test]
async fn test_invalid_options_rejected_before_any_call() {
    let model = Arc::new(ScriptedModel::new());
    let err = orchestrator(model.clone())
        .run("AI", "technology", &options(0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { code: "INVALID_MAX_ARTICLES", .. }));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_location_reaches_web_search() {
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_text(STRUCTURED),
    );
    let options = SearchOptions {
        search_context_size: SearchContextSize::Low,
        location: Some(Location {
            country: Some("DE".to_string()),
            city: Some("Berlin".to_string()),
            region: None,
            timezone: Some("Europe/Berlin".to_string()),
        }),
        max_articles: 2,
    };
    orchestrator(model.clone()).run("AI", "technology", &options).await.unwrap();

    let web_search = model.calls()[0].web_search.clone().unwrap();
    assert_eq!(web_search.search_context_size, SearchContextSize::Low);
    let location = web_search.user_location.unwrap();
    assert_eq!(location.city.as_deref(), Some("Berlin"));
    assert!(location.timezone.is_none());
}

#[tokio::test]
async fn test_service_serves_repeat_requests_from_cache() {
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_text(STRUCTURED),
    );
    let cache = Arc::new(TtlCache::with_default_ttl(Duration::from_secs(3600)));
    let service = NewsService::new(orchestrator(model.clone()), cache.clone());

    let first = service.fetch("AI regulation", "technology", &options(2)).await.unwrap();
    let second = service.fetch("AI regulation", "technology", &options(2)).await.unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert!(second.search_time < 0.5);
    assert_eq!(first.articles, second.articles);
    assert_eq!(model.call_count(), 3);

    assert_eq!(service.clear_cache().await, 1);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_service_skips_caching_fallback_by_default() {
    let model = Arc::new(
        ScriptedModel::new()
            .then_reply(discovery())
            .then_text(ANALYSIS)
            .then_text("garbage"),
    );
    let cache = Arc::new(TtlCache::with_default_ttl(Duration::from_secs(3600)));
    let service = NewsService::new(orchestrator(model), cache.clone());

    let response = service.fetch("AI", "technology", &options(2)).await.unwrap();
    assert!(response.fallback_used);
    assert!(cache.is_empty().await);
}

/// Dummy output everywhere except prompts mentioning `fail_on`.
#[derive(Debug)]
struct FlakyModel {
    inner: DummyModel,
    fail_on: &'static str,
}

#[async_trait]
impl InferenceModel for FlakyModel {
    fn name(&self) -> &str {
        "Flaky"
    }

    async fn complete(&self, request: CompletionRequest) -> gn_core::Result<Completion> {
        if request.prompt.contains(self.fail_on) {
            return Err(Error::from_status(503, "overloaded"));
        }
        self.inner.complete(request).await
    }
}

#[tokio::test]
async fn test_fetch_all_isolates_category_failures() {
    let model = Arc::new(FlakyModel {
        inner: DummyModel::new(),
        fail_on: "sports news today",
    });
    let cache = Arc::new(TtlCache::with_default_ttl(Duration::from_secs(3600)));
    let service = NewsService::new(Orchestrator::new(model, Duration::from_secs(30)), cache.clone());

    let all = service.fetch_all(&options(2)).await;
    assert_eq!(all.len(), gn_core::categories::CATEGORIES.len());

    for (category, response) in &all {
        assert_eq!(&response.category, category);
        assert!(!response.articles.is_empty());
        assert!(response.articles.len() <= 2);
        assert_eq!(response.fallback_used, category == "sports", "category {}", category);
    }
    assert_eq!(all["sports"].articles[0].title, "Latest Sports News");
    assert_eq!(cache.len().await, all.len() - 1);
}
