pub mod categories;
pub mod credibility;
pub mod duration;
pub mod error;
pub mod models;
pub mod options;
pub mod types;

pub use error::{Error, Result};
pub use models::{Completion, CompletionRequest, InferenceModel, Stage, WebSearchOptions};
pub use options::{Location, SearchContextSize, SearchOptions, SearchSettings, SettingsPatch};
pub use types::{Citation, NewsArticle, NewsResponse, SourceRef};

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncates to `max` characters, replacing the tail with `...` when cut.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    format!("{}...", truncate_chars(text, keep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(ellipsize("abcdefghij", 6), "abc...");
        assert_eq!(ellipsize("short", 10), "short");
    }
}
