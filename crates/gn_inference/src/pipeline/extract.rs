//! Turns stage-3 output into article drafts.
//!
//! The structuring stage is asked for a bare JSON array but routinely wraps
//! it in prose, truncates it or emits something else entirely. Parsing is a
//! chain of strategies tried in order, the first one producing a non-empty
//! array wins. When none does, drafts are derived from the analysis prose,
//! and as a last resort a single catch-all draft is synthesized, so the
//! chain never comes back empty.

use gn_core::categories::display_name;
use gn_core::{ellipsize, truncate_chars};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FULL_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*\{[\s\S]*\}\s*\]").expect("valid regex"));
static HEADLINE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{[^{}]*"headline"[^{}]*\}"#).expect("valid regex"));
static INTRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(here are \d+ recent news articles?|based on the search results?|i found \d+ articles?)[:.,]?")
        .expect("valid regex")
});
static SECTION_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\n\s*\n|^\s*\d+\.\s+|Article \d+:|^\s*#{2,}\s+").expect("valid regex"));
static LINE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.\s*|[#*\-]+\s*)+").expect("valid regex"));

/// Sections shorter than this are treated as noise.
const MIN_SECTION_CHARS: usize = 100;
const SUMMARY_CHARS: usize = 200;
const CATCH_ALL_CHARS: usize = 1000;

/// One article as proposed by the model, every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleDraft {
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub importance_score: Option<f64>,
    pub source_title: Option<String>,
    pub source_url: Option<String>,
    pub credibility_level: Option<String>,
    pub verification_status: Option<String>,
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match object.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("/10").trim().parse().ok(),
        _ => None,
    };
    value.filter(|v: &f64| v.is_finite())
}

impl ArticleDraft {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            headline: text_field(object, "headline"),
            summary: text_field(object, "summary"),
            content: text_field(object, "content"),
            importance_score: number_field(object, "importanceScore"),
            source_title: text_field(object, "sourceTitle"),
            source_url: text_field(object, "sourceUrl"),
            credibility_level: text_field(object, "credibilityLevel"),
            verification_status: text_field(object, "verificationStatus"),
        }
    }
}

/// Parses a JSON array of article objects. Non-object elements are skipped;
/// an array with no objects counts as a failure.
fn parse_array(json: &str) -> Option<Vec<ArticleDraft>> {
    let value: Value = serde_json::from_str(json).ok()?;
    let drafts: Vec<ArticleDraft> = value
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .map(ArticleDraft::from_object)
        .collect();
    (!drafts.is_empty()).then_some(drafts)
}

pub trait ParseStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, raw: &str) -> Option<Vec<ArticleDraft>>;
}

/// A complete `[ { ... } ]` block.
pub struct FullArrayMatch;

impl ParseStrategy for FullArrayMatch {
    fn name(&self) -> &'static str {
        "full-array"
    }

    fn parse(&self, raw: &str) -> Option<Vec<ArticleDraft>> {
        parse_array(FULL_ARRAY.find(raw)?.as_str())
    }
}

/// Everything between the first `[` and the last `]`.
pub struct BracketSlice;

impl ParseStrategy for BracketSlice {
    fn name(&self) -> &'static str {
        "bracket-slice"
    }

    fn parse(&self, raw: &str) -> Option<Vec<ArticleDraft>> {
        let start = raw.find('[')?;
        let end = raw.rfind(']')?;
        if end <= start {
            return None;
        }
        parse_array(&raw[start..=end])
    }
}

/// Individual flat objects carrying a `"headline"` key, wrapped into an array.
pub struct HeadlineObjects;

impl ParseStrategy for HeadlineObjects {
    fn name(&self) -> &'static str {
        "headline-objects"
    }

    fn parse(&self, raw: &str) -> Option<Vec<ArticleDraft>> {
        let drafts: Vec<ArticleDraft> = HEADLINE_OBJECT
            .find_iter(raw)
            .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
            .filter_map(|v| v.as_object().map(ArticleDraft::from_object))
            .collect();
        (!drafts.is_empty()).then_some(drafts)
    }
}

pub fn default_strategies() -> Vec<Box<dyn ParseStrategy>> {
    vec![Box::new(FullArrayMatch), Box::new(BracketSlice), Box::new(HeadlineObjects)]
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub drafts: Vec<ArticleDraft>,
    /// Name of the strategy that produced the drafts.
    pub strategy: &'static str,
    pub fallback_used: bool,
}

pub struct Extractor {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(default_strategies())
    }
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    /// Always returns at least one draft and at most `max_articles`.
    pub fn extract(&self, structured: &str, analysis: &str, category: &str, max_articles: usize) -> Extraction {
        let max_articles = max_articles.max(1);
        let structured = structured.trim();

        for strategy in &self.strategies {
            if let Some(mut drafts) = strategy.parse(structured) {
                drafts.truncate(max_articles);
                tracing::debug!("Parsed {} structured articles via {}", drafts.len(), strategy.name());
                return Extraction {
                    drafts,
                    strategy: strategy.name(),
                    fallback_used: false,
                };
            }
        }

        tracing::warn!(
            "⚠️ Structured output unparseable, deriving articles from analysis text: {}",
            truncate_chars(structured, 200)
        );
        let drafts = drafts_from_prose(analysis, max_articles);
        if !drafts.is_empty() {
            return Extraction {
                drafts,
                strategy: "prose",
                fallback_used: true,
            };
        }

        Extraction {
            drafts: vec![catch_all(analysis, category)],
            strategy: "catch-all",
            fallback_used: true,
        }
    }
}

fn clean_line(line: &str) -> String {
    let line = LINE_PREFIX.replace(line.trim(), "");
    line.trim()
        .trim_matches('*')
        .trim_end_matches(':')
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Splits a single-line section at its first sentence end.
fn split_first_sentence(text: &str) -> Option<(&str, &str)> {
    let idx = text.find(|c| matches!(c, '.' | '!' | '?'))?;
    let (head, rest) = text.split_at(idx + 1);
    let head = head.trim();
    let rest = rest.trim();
    (head.chars().count() >= 15 && !rest.is_empty()).then_some((head, rest))
}

/// Content-derived structuring: one draft per substantial section, headline
/// from its first line, the rest as body.
pub fn drafts_from_prose(text: &str, max_articles: usize) -> Vec<ArticleDraft> {
    let text = INTRO.replace(text.trim(), "");

    SECTION_BREAK
        .split(&text)
        .map(str::trim)
        .filter(|section| section.chars().count() > MIN_SECTION_CHARS)
        .filter_map(|section| {
            let lines: Vec<&str> = section.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            let (headline, body) = match lines.as_slice() {
                [] => return None,
                [only] => {
                    let (head, rest) = split_first_sentence(only)?;
                    (clean_line(head), rest.to_string())
                }
                [first, rest @ ..] => (clean_line(first), rest.join(" ")),
            };
            let body = body.trim().to_string();
            if body.is_empty() {
                return None;
            }
            Some(ArticleDraft {
                headline: Some(headline).filter(|h| !h.is_empty()),
                summary: Some(ellipsize(&body, SUMMARY_CHARS)),
                content: Some(body),
                ..Default::default()
            })
        })
        .take(max_articles)
        .collect()
}

/// Single "Latest {Category} News" draft built from the head of `text`.
pub fn catch_all(text: &str, category: &str) -> ArticleDraft {
    let text = text.trim();
    let summary = if text.is_empty() {
        None
    } else {
        Some(format!("{}...", truncate_chars(text, SUMMARY_CHARS)))
    };
    let content = Some(text)
        .filter(|t| !t.is_empty())
        .map(|t| ellipsize(t, CATCH_ALL_CHARS + 3));
    ArticleDraft {
        headline: Some(format!("Latest {} News", display_name(category))),
        summary,
        content,
        ..Default::default()
    }
}
