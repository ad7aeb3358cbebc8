use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use gn_core::{
    options::max_articles_from_json, Error, Location, NewsResponse, SearchContextSize, SearchOptions, SearchSettings,
    SettingsPatch,
};
use gn_storage::UNKNOWN_CLIENT;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// First hop of `x-forwarded-for`, then `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded.or(real).unwrap_or(UNKNOWN_CLIENT).to_string()
}

fn required_text<'a>(body: &'a Value, field: &str, code: &'static str) -> ApiResult<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(code, format!("{} is required and must be a non-empty string", field)))
}

/// Overlays request-supplied search options on the configured defaults.
pub fn parse_search_options(raw: Option<&Value>, defaults: SearchOptions) -> ApiResult<SearchOptions> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(defaults),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(ApiError::validation("INVALID_JSON", "searchOptions must be an object")),
    };
    let mut options = defaults;

    if let Some(value) = raw.get("maxArticles").filter(|v| !v.is_null()) {
        options.max_articles = max_articles_from_json(value)?;
    }

    if let Some(value) = raw.get("searchContextSize").filter(|v| !v.is_null()) {
        options.search_context_size = value
            .as_str()
            .ok_or_else(|| {
                ApiError::validation(
                    "INVALID_SEARCH_CONTEXT",
                    "searchContextSize must be one of: low, medium, high",
                )
            })?
            .parse::<SearchContextSize>()?;
    }

    if let Some(value) = raw.get("location").filter(|v| !v.is_null()) {
        let location: Location = serde_json::from_value(value.clone()).map_err(|_| {
            ApiError::validation("INVALID_LOCATION", "location must be an object of country, city, region, timezone strings")
        })?;
        options.location = Some(location).filter(|l| !l.is_empty());
    }

    Ok(options)
}

async fn enforce_rate_limit(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let client = client_ip(headers);
    let decision = state.limiter.check_limit(&client).await;
    if !decision.allowed {
        tracing::warn!("🚦 Rate limit exceeded for {}", client);
        return Err(Error::RateLimited {
            remaining: decision.remaining,
            reset_at: decision.reset_time,
        }
        .into());
    }
    tracing::debug!("🚦 {} has {} requests left", client, decision.remaining);
    Ok(())
}

pub async fn search_news(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<NewsResponse>> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::validation("INVALID_JSON", "Request body must be valid JSON"))?;
    let query = required_text(&body, "query", "INVALID_QUERY")?;
    let category = required_text(&body, "category", "INVALID_CATEGORY")?;

    enforce_rate_limit(&state, &headers).await?;

    let defaults = state.settings.read().await.search_options();
    let options = parse_search_options(body.get("searchOptions"), defaults)?;

    tracing::info!("📰 News request: '{}' in {} ({} articles)", query, category, options.max_articles);
    let response = state.service.fetch(query, category, &options).await?;
    Ok(Json(response))
}

pub async fn all_news(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<BTreeMap<String, NewsResponse>>> {
    enforce_rate_limit(&state, &headers).await?;
    let options = state.settings.read().await.search_options();
    Ok(Json(state.service.fetch_all(&options).await))
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SearchSettings> {
    Json(state.settings.read().await.clone())
}

pub async fn update_settings(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<SearchSettings>> {
    let patch: SettingsPatch = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation("INVALID_JSON", format!("Invalid settings: {}", e)))?;
    let updated = {
        let mut settings = state.settings.write().await;
        settings.apply(patch)?;
        settings.clone()
    };
    state.service.clear_cache().await;
    tracing::info!("⚙️ Search settings updated");
    Ok(Json(updated))
}

pub async fn reset_settings(State(state): State<Arc<AppState>>) -> Json<SearchSettings> {
    let defaults = SearchSettings::default();
    *state.settings.write().await = defaults.clone();
    state.service.clear_cache().await;
    tracing::info!("⚙️ Search settings reset to defaults");
    Json(defaults)
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.service.clear_cache().await;
    Json(json!({ "cleared": cleared }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let entries = state.service.cache().len().await;
    let limits = state.limiter.stats().await;
    Json(json!({
        "status": "ok",
        "hasApiKey": state.has_api_key,
        "model": state.service.model_name(),
        "cache": { "entries": entries },
        "rateLimit": limits,
    }))
}
