use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use gn_core::{Citation, Completion, Error};
use gn_inference::models::ScriptedModel;
use gn_inference::{NewsService, Orchestrator};
use gn_storage::{RateLimitConfig, RateLimiter, TtlCache};
use gn_web::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const ANALYSIS: &str = "1. Chipmaker unveils low-power inference accelerator\n\
    The company says the part halves energy use per token compared with its previous generation \
    and will ship to cloud customers next quarter.";

const STRUCTURED: &str = r#"[{"headline": "Chipmaker unveils inference accelerator", "summary": "Lower power.",
  "content": "Ships next quarter.", "importanceScore": 6, "sourceTitle": "Reuters Technology",
  "sourceUrl": "https://reuters.com/tech/chip"}]"#;

fn discovery() -> Completion {
    Completion {
        content: "A chipmaker announced a new accelerator.".to_string(),
        citations: vec![Citation {
            url: "https://reuters.com/tech/chip".to_string(),
            title: "Reuters Technology".to_string(),
            start_index: 0,
            end_index: 20,
        }],
    }
}

fn healthy_model() -> ScriptedModel {
    ScriptedModel::new()
        .then_reply(discovery())
        .then_text(ANALYSIS)
        .then_text(STRUCTURED)
}

struct TestApp {
    router: Router,
    service: Arc<NewsService>,
    model: Arc<ScriptedModel>,
}

async fn test_app(model: ScriptedModel, max_requests: u32) -> TestApp {
    let model = Arc::new(model);
    let cache = Arc::new(TtlCache::with_default_ttl(Duration::from_secs(3600)));
    let service = Arc::new(NewsService::new(
        Orchestrator::new(model.clone(), Duration::from_secs(30)),
        cache,
    ));
    let limiter = Arc::new(RateLimiter::new(&RateLimitConfig {
        max_requests,
        ..Default::default()
    }));
    let router = create_app(AppState::new(service.clone(), limiter, false)).await;
    TestApp { router, service, model }
}

fn post_news(body: impl Into<String>, client: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/news")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.into()))
        .unwrap()
}

fn request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_request_validation_order() {
    let app = test_app(ScriptedModel::new(), 60).await;

    let (status, body) = send(&app.router, post_news("{not json", "1.1.1.1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    assert!(body["details"].as_str().unwrap().contains("valid JSON"));
    assert!(body["timestamp"].is_string());

    let (_, body) = send(&app.router, post_news(r#"{"category": "technology"}"#, "1.1.1.1")).await;
    assert_eq!(body["code"], "INVALID_QUERY");

    let (_, body) = send(&app.router, post_news(r#"{"query": "AI", "category": "  "}"#, "1.1.1.1")).await;
    assert_eq!(body["code"], "INVALID_CATEGORY");

    let (_, body) = send(
        &app.router,
        post_news(
            json!({ "query": "AI", "category": "technology", "searchOptions": { "maxArticles": 11 } }).to_string(),
            "1.1.1.1",
        ),
    )
    .await;
    assert_eq!(body["code"], "INVALID_MAX_ARTICLES");

    let (_, body) = send(
        &app.router,
        post_news(
            json!({ "query": "AI", "category": "technology", "searchOptions": { "searchContextSize": "huge" } })
                .to_string(),
            "1.1.1.1",
        ),
    )
    .await;
    assert_eq!(body["code"], "INVALID_SEARCH_CONTEXT");
    assert_eq!(app.model.call_count(), 0);
}

#[tokio::test]
async fn test_rate_limit_applies_before_option_validation() {
    let app = test_app(ScriptedModel::new(), 2).await;
    let bad_options =
        json!({ "query": "AI", "category": "technology", "searchOptions": { "maxArticles": 0 } }).to_string();

    for _ in 0..2 {
        let (status, body) = send(&app.router, post_news(bad_options.clone(), "203.0.113.9")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_MAX_ARTICLES");
    }

    let response = app
        .router
        .clone()
        .oneshot(post_news(bad_options.clone(), "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert!(body["details"].as_str().unwrap().contains("60 minutes"));
    assert_eq!(body["rateLimitInfo"]["remaining"], 0);
    assert!(body["rateLimitInfo"]["resetTime"].as_i64().unwrap() > 0);

    // Malformed bodies are rejected before they count
    let (status, body) = send(&app.router, post_news("{", "203.0.113.9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");

    // Other clients are unaffected
    let (status, _) = send(&app.router, post_news(bad_options, "198.51.100.1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_news_request_and_cache_hit() {
    let app = test_app(healthy_model(), 60).await;
    let body = json!({ "query": "AI chips", "category": "technology", "searchOptions": { "maxArticles": 1 } })
        .to_string();

    let (status, first) = send(&app.router, post_news(body.clone(), "1.1.1.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(first["citations"], 1);
    assert_eq!(first["fallbackUsed"], false);
    let article = &first["articles"][0];
    assert_eq!(article["title"], "Chipmaker unveils inference accelerator");
    assert_eq!(article["sourceUrls"][0], "https://reuters.com/tech/chip");
    assert_eq!(article["credibilityScore"], 7);

    let (status, second) = send(&app.router, post_news(body, "1.1.1.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["articles"], first["articles"]);
    assert_eq!(app.model.call_count(), 3);
}

#[tokio::test]
async fn test_upstream_errors_are_mapped() {
    let model = ScriptedModel::new().then_fail(Error::from_status(429, "quota"));
    let app = test_app(model, 60).await;
    let (status, body) = send(
        &app.router,
        post_news(r#"{"query": "AI", "category": "technology"}"#, "1.1.1.1"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "OPENAI_RATE_LIMIT");

    let model = ScriptedModel::new().then_fail(Error::from_status(401, "bad key"));
    let app = test_app(model, 60).await;
    let (status, body) = send(
        &app.router,
        post_news(r#"{"query": "AI", "category": "technology"}"#, "1.1.1.1"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "OPENAI_AUTH_ERROR");
}

#[tokio::test]
async fn test_settings_changes_clear_cache() {
    let app = test_app(healthy_model(), 60).await;
    let (status, _) = send(
        &app.router,
        post_news(r#"{"query": "AI chips", "category": "technology"}"#, "1.1.1.1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.service.cache().len().await, 1);

    let (status, settings) = send(&app.router, request("GET", "/api/settings", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["maxArticles"], 3);
    assert_eq!(settings["location"]["city"], "Pune");

    let (status, settings) = send(
        &app.router,
        request("PUT", "/api/settings", json!({ "maxArticles": 5, "searchContextSize": "low" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["maxArticles"], 5);
    assert_eq!(settings["searchContextSize"], "low");
    assert_eq!(settings["language"], "en");
    assert!(app.service.cache().is_empty().await);

    let (status, body) = send(&app.router, request("PUT", "/api/settings", json!({ "maxArticles": 50 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_MAX_ARTICLES");
    let (_, settings) = send(&app.router, request("GET", "/api/settings", Value::Null)).await;
    assert_eq!(settings["maxArticles"], 5);

    let (status, settings) = send(&app.router, request("PUT", "/api/settings", json!({ "maxArticles": 4.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["maxArticles"], 4);

    let (status, settings) = send(&app.router, request("DELETE", "/api/settings", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["maxArticles"], 3);
    assert_eq!(settings["searchContextSize"], "medium");
}

#[tokio::test]
async fn test_clear_cache_and_health() {
    let app = test_app(healthy_model(), 60).await;
    send(
        &app.router,
        post_news(r#"{"query": "AI chips", "category": "technology"}"#, "1.1.1.1"),
    )
    .await;

    let (status, health) = send(&app.router, request("GET", "/api/health", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["hasApiKey"], false);
    assert_eq!(health["model"], "Scripted");
    assert_eq!(health["cache"]["entries"], 1);
    assert_eq!(health["rateLimit"]["identifiers"], 1);
    assert_eq!(health["rateLimit"]["requests"], 1);

    let (status, body) = send(&app.router, request("DELETE", "/api/cache", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);
    assert!(app.service.cache().is_empty().await);
}
