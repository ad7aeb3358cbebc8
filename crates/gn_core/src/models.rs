use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::options::{Location, SearchContextSize};
use crate::types::Citation;
use crate::Result;

/// One sequential model invocation of the news pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Discovery,
    Analysis,
    Structuring,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Discovery => write!(f, "discovery"),
            Stage::Analysis => write!(f, "analysis"),
            Stage::Structuring => write!(f, "structuring"),
        }
    }
}

/// Web-search augmentation passed along with a discovery prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchOptions {
    pub search_context_size: SearchContextSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<Location>,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub stage: Stage,
    pub prompt: String,
    pub web_search: Option<WebSearchOptions>,
}

impl CompletionRequest {
    pub fn new(stage: Stage, prompt: impl Into<String>) -> Self {
        Self {
            stage,
            prompt: prompt.into(),
            web_search: None,
        }
    }

    pub fn with_web_search(mut self, options: WebSearchOptions) -> Self {
        self.web_search = Some(options);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub citations: Vec<Citation>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            citations: Vec::new(),
        }
    }
}

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Submit a prompt, optionally with web search, and return the text
    /// plus any citation annotations.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}
