use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gn_core::{Citation, Completion, CompletionRequest, Error, Result, WebSearchOptions};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::InferenceModel;
use crate::Config;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_search_options: Option<ApiWebSearchOptions>,
}

#[derive(Serialize)]
struct ApiWebSearchOptions {
    search_context_size: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_location: Option<ApiUserLocation>,
}

#[derive(Serialize)]
struct ApiUserLocation {
    #[serde(rename = "type")]
    kind: &'static str,
    approximate: ApproximateLocation,
}

#[derive(Serialize)]
struct ApproximateLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
}

impl From<&WebSearchOptions> for ApiWebSearchOptions {
    fn from(options: &WebSearchOptions) -> Self {
        Self {
            search_context_size: options.search_context_size.as_str(),
            user_location: options.user_location.as_ref().map(|l| ApiUserLocation {
                kind: "approximate",
                approximate: ApproximateLocation {
                    country: l.country.clone(),
                    city: l.city.clone(),
                    region: l.region.clone(),
                },
            }),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Deserialize)]
struct Annotation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url_citation: Option<UrlCitation>,
}

#[derive(Deserialize)]
struct UrlCitation {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    start_index: usize,
    #[serde(default)]
    end_index: usize,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat-completions client for OpenAI-compatible endpoints with web search.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    search_model: String,
    chat_model: String,
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("OpenAI API key is required".to_string()))?;
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_model: config.search_model.clone(),
            chat_model: config.chat_model.clone(),
        })
    }

    fn model_for(&self, request: &CompletionRequest) -> &str {
        if request.web_search.is_some() {
            &self.search_model
        } else {
            &self.chat_model
        }
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("search_model", &self.search_model)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| gn_core::truncate_chars(body, 300).to_string())
}

fn into_completion(response: ChatResponse) -> Completion {
    let Some(choice) = response.choices.into_iter().next() else {
        return Completion::default();
    };
    let citations = choice
        .message
        .annotations
        .into_iter()
        .filter(|a| a.kind == "url_citation")
        .filter_map(|a| a.url_citation)
        .map(|c| Citation {
            url: c.url,
            title: c.title,
            start_index: c.start_index,
            end_index: c.end_index,
        })
        .collect();
    Completion {
        content: choice.message.content.unwrap_or_default(),
        citations,
    }
}

#[async_trait]
impl InferenceModel for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let model = self.model_for(&request);
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            web_search_options: request.web_search.as_ref().map(ApiWebSearchOptions::from),
        };

        tracing::debug!("🧠 {} stage -> {} ({} prompt chars)", request.stage, model, request.prompt.len());
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamService(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI {} stage failed with {}", request.stage, status);
            return Err(Error::from_status(status.as_u16(), error_message(&text)));
        }

        let parsed = response.json::<ChatResponse>().await?;
        Ok(into_completion(parsed))
    }
}
