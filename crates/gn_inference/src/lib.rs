use std::time::Duration;

pub mod models;
pub mod pipeline;
pub mod service;

pub use models::{create_model, InferenceModel};
pub use pipeline::Orchestrator;
pub use service::NewsService;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SEARCH_MODEL: &str = "gpt-4o-search-preview";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Provider selection, `openai` or `dummy`.
    pub model_name: Option<String>,
    /// Model used for the web-search discovery stage.
    pub search_model: String,
    /// Model used for analysis and structuring.
    pub chat_model: String,
    pub stage_timeout: Duration,
}

impl Config {
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map_or(false, |key| !key.trim().is_empty() && key != "your-api-key-here")
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("search_model", &self.search_model)
            .field("chat_model", &self.chat_model)
            .field("stage_timeout", &self.stage_timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: None,
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::pipeline::Orchestrator;
    pub use super::service::NewsService;
    pub use super::Config;
    pub use gn_core::{Error, NewsArticle, NewsResponse, Result, SearchOptions};
}
