use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Stage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),

    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("Rate limit exceeded ({remaining} remaining, resets at {reset_at})")]
    RateLimited { remaining: u32, reset_at: DateTime<Utc> },

    #[error("Upstream rejected credentials: {0}")]
    UpstreamAuth(String),

    #[error("Upstream rate limit exceeded: {0}")]
    UpstreamRateLimit(String),

    #[error("Upstream service unavailable: {0}")]
    UpstreamService(String),

    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("No content returned by the {stage} stage")]
    NoContent { stage: Stage },

    #[error("The {stage} stage timed out")]
    Timeout { stage: Stage },

    #[error("No articles found")]
    EmptyResult,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inference error: {0}")]
    Inference(String),
}

impl Error {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    /// Classifies a non-success provider status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::UpstreamAuth(message),
            429 => Self::UpstreamRateLimit(message),
            s if s >= 500 => Self::UpstreamService(message),
            s => Self::Upstream { status: s, message },
        }
    }

    /// Whether the error originated at the model provider rather than locally.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamAuth(_)
                | Self::UpstreamRateLimit(_)
                | Self::UpstreamService(_)
                | Self::Upstream { .. }
                | Self::NoContent { .. }
                | Self::Timeout { .. }
                | Self::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
