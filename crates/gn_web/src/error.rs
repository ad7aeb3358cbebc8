use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use gn_core::Error;
use serde_json::json;

/// Error envelope returned by every endpoint.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        ApiError(Error::validation(code, message))
    }

    /// Status, code, client-facing message and hint.
    fn parts(&self) -> (StatusCode, &'static str, String, String) {
        let hint = |text: &str| text.to_string();
        match &self.0 {
            Error::Validation { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone(), hint(validation_hint(code)))
            }
            Error::RateLimited { reset_at, .. } => {
                let minutes = minutes_until(*reset_at);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMIT_EXCEEDED",
                    "Rate limit exceeded".to_string(),
                    format!(
                        "Too many requests. Try again in {} minute{}.",
                        minutes,
                        if minutes == 1 { "" } else { "s" }
                    ),
                )
            }
            Error::EmptyResult => (
                StatusCode::NOT_FOUND,
                "NO_ARTICLES_FOUND",
                "No articles found".to_string(),
                hint("Try a different query or category."),
            ),
            Error::UpstreamAuth(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OPENAI_AUTH_ERROR",
                "News provider authentication failed".to_string(),
                hint("Check the configured API key."),
            ),
            Error::UpstreamRateLimit(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "OPENAI_RATE_LIMIT",
                "News provider is rate limiting requests".to_string(),
                hint("Please try again in a few minutes."),
            ),
            Error::UpstreamService(_) | Error::Http(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "OPENAI_SERVICE_ERROR",
                "News provider is temporarily unavailable".to_string(),
                hint("Please try again shortly."),
            ),
            Error::Timeout { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_TIMEOUT",
                "News provider took too long to respond".to_string(),
                hint("Please try again shortly."),
            ),
            Error::Upstream { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "OPENAI_UNKNOWN_ERROR",
                "News provider returned an unexpected error".to_string(),
                hint("Please try again later. If the problem persists, contact support."),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                hint("An unexpected error occurred. Please try again later."),
            ),
        }
    }
}

fn validation_hint(code: &str) -> &'static str {
    match code {
        "INVALID_JSON" => "Please ensure your request body contains valid JSON.",
        "INVALID_QUERY" => "Provide a non-empty \"query\" string.",
        "INVALID_CATEGORY" => "Provide a non-empty \"category\" string.",
        "INVALID_MAX_ARTICLES" => "Set maxArticles to a whole number between 1 and 10.",
        "INVALID_SEARCH_CONTEXT" => "Use low, medium or high for searchContextSize.",
        "INVALID_LOCATION" => "Location fields country, city, region and timezone must be strings.",
        _ => "Check the request parameters and try again.",
    }
}

/// Whole minutes until `reset_at`, rounded up, at least one.
fn minutes_until(reset_at: DateTime<Utc>) -> i64 {
    let millis = (reset_at - Utc::now()).num_milliseconds().max(0);
    ((millis + 59_999) / 60_000).max(1)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::error!("❌ {} ({}): {}", code, status.as_u16(), self.0);
        } else {
            tracing::debug!("Request rejected with {}: {}", code, self.0);
        }

        let mut body = json!({
            "error": message,
            "code": code,
            "details": details,
            "timestamp": Utc::now(),
        });

        let mut retry_after = None;
        if let Error::RateLimited { remaining, reset_at } = &self.0 {
            body["rateLimitInfo"] = json!({
                "remaining": remaining,
                "resetTime": reset_at.timestamp_millis(),
            });
            let secs = (*reset_at - Utc::now()).num_seconds().max(1);
            retry_after = HeaderValue::from_str(&secs.to_string()).ok();
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
