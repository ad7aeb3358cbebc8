use std::collections::HashSet;

use gn_core::{Citation, SourceRef};
use url::Url;

/// Title used when no real source is available.
pub const PLACEHOLDER_SOURCE: &str = "Web Search Result";
/// Proposed titles this short are discarded.
const MIN_TITLE_CHARS: usize = 5;

/// Unique citation sources in first-seen order. Citations without a URL are
/// dropped; an empty title is replaced by the URL host.
pub fn unique_sources(citations: &[Citation]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    citations
        .iter()
        .filter(|c| !c.url.trim().is_empty())
        .filter(|c| seen.insert(c.url.trim().to_string()))
        .map(|c| {
            let url = c.url.trim().to_string();
            let title = if c.title.trim().is_empty() {
                Url::parse(&url)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_else(|| PLACEHOLDER_SOURCE.to_string())
            } else {
                c.title.trim().to_string()
            };
            SourceRef::new(title, url)
        })
        .collect()
}

/// `sources[index mod len]`, or a placeholder with an empty URL when there
/// are no sources at all.
pub fn cyclic_candidate(sources: &[SourceRef], index: usize) -> SourceRef {
    if sources.is_empty() {
        return SourceRef::new(PLACEHOLDER_SOURCE, "");
    }
    sources[index % sources.len()].clone()
}

pub fn is_absolute_http_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    candidate.starts_with("http")
        && Url::parse(candidate)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false)
}

/// Primary source for the article at `index`: the model's proposal where it
/// is usable, the cyclic candidate otherwise.
pub fn primary_source(
    proposed_title: Option<&str>,
    proposed_url: Option<&str>,
    sources: &[SourceRef],
    index: usize,
) -> SourceRef {
    let candidate = cyclic_candidate(sources, index);
    let url = proposed_url
        .filter(|u| is_absolute_http_url(u))
        .map(|u| u.trim().to_string())
        .unwrap_or(candidate.url);
    let title = proposed_title
        .map(str::trim)
        .filter(|t| t.chars().count() > MIN_TITLE_CHARS)
        .map(str::to_string)
        .unwrap_or(candidate.title);
    SourceRef::new(title, url)
}
