use std::fmt;

use async_trait::async_trait;
use gn_core::{Citation, Completion, CompletionRequest, Result, Stage};

use super::InferenceModel;

const ITEMS: usize = 3;

/// Offline provider producing deterministic output for every stage, used when
/// no API key is configured.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

/// The first double-quoted phrase of a prompt, which the pipeline prompts use
/// for the topic.
fn topic(prompt: &str) -> &str {
    prompt
        .split('"')
        .nth(1)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("current events")
}

fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn discovery(topic: &str) -> Completion {
    let mut content = String::new();
    let mut citations = Vec::new();
    for i in 1..=ITEMS {
        let start = content.len();
        content.push_str(&format!(
            "{i}. Developments in {topic}, part {i}\nObservers tracking {topic} reported a new development today, \
             with analysts describing it as one of several shifts expected over the coming weeks.\n\n"
        ));
        citations.push(Citation {
            url: format!("https://example.com/news/{}-{}", slug(topic), i),
            title: format!("Example Wire: {} #{}", topic, i),
            start_index: start,
            end_index: content.len(),
        });
    }
    Completion { content, citations }
}

fn analysis(topic: &str) -> Completion {
    let body = (1..=ITEMS)
        .map(|i| {
            format!(
                "## Developments in {topic}, part {i}\nImportance: {score}/10. The report is consistent across the \
                 cited outlets and is categorized as a general update on {topic}.",
                score = 9 - i
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    Completion::text(body)
}

fn structuring(topic: &str) -> Completion {
    let articles: Vec<serde_json::Value> = (1..=ITEMS)
        .map(|i| {
            serde_json::json!({
                "headline": format!("Developments in {}, part {}", topic, i),
                "summary": format!("A new development in {} was reported today. Analysts expect further shifts.", topic),
                "content": format!("Observers tracking {} reported a new development today.", topic),
                "importanceScore": 9 - i,
                "sourceTitle": "",
                "sourceUrl": "",
                "credibilityLevel": "Medium",
                "verificationStatus": "Demo content"
            })
        })
        .collect();
    Completion::text(serde_json::Value::Array(articles).to_string())
}

#[async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let topic = topic(&request.prompt);
        Ok(match request.stage {
            Stage::Discovery => discovery(topic),
            Stage::Analysis => analysis(topic),
            Stage::Structuring => structuring(topic),
        })
    }
}
