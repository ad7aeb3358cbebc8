use gn_core::SourceRef;

pub fn discovery(query: &str, max_articles: usize) -> String {
    format!(
        "Search for recent news about: \"{}\". Find {} distinct, factual news articles from credible sources. \
         For each one give a clear headline, the key facts, and the outlet that reported it.",
        query.trim(),
        max_articles
    )
}

fn numbered_sources(sources: &[SourceRef]) -> String {
    if sources.is_empty() {
        return "(no source URLs were returned)".to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. \"{}\" - {}", i + 1, s.title, s.url))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn analysis(query: &str, discovered: &str, sources: &[SourceRef], max_articles: usize) -> String {
    format!(
        "Topic: \"{query}\"\n\
         Based on this search content, identify exactly {max_articles} distinct news articles.\n\n\
         Content to analyze:\n{discovered}\n\n\
         Available source URLs with titles:\n{sources}\n\n\
         For each article assess:\n\
         1. Importance score (1-10) based on impact and relevance\n\
         2. Credibility of its sources\n\
         3. Key facts and their verification status\n\
         4. Its category\n\n\
         Present the {max_articles} articles as clearly separated sections, each starting with its headline.",
        query = query.trim(),
        sources = numbered_sources(sources),
    )
}

pub fn structuring(query: &str, analyzed: &str, sources: &[SourceRef], max_articles: usize) -> String {
    let sources = if sources.is_empty() {
        "(none)".to_string()
    } else {
        sources
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. Title: \"{}\"\n   URL: {}", i + 1, s.title, s.url))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    format!(
        "Topic: \"{query}\"\n\
         Based on the analyzed content, create exactly {max_articles} distinct news articles in valid JSON.\n\n\
         Analyzed content:\n{analyzed}\n\n\
         Available sources (use these exact URLs and titles):\n{sources}\n\n\
         IMPORTANT: Return ONLY a valid JSON array, with no text before or after it.\n\n\
         Each element must have exactly these fields:\n\
         [\n  {{\n    \"headline\": \"Unique headline\",\n    \"summary\": \"Two-sentence summary of the key facts\",\n\
         \x20   \"content\": \"Detailed content\",\n    \"importanceScore\": 8,\n\
         \x20   \"sourceTitle\": \"Exact title from the sources above\",\n\
         \x20   \"sourceUrl\": \"Exact URL from the sources above\",\n\
         \x20   \"credibilityLevel\": \"High\",\n    \"verificationStatus\": \"Verified\"\n  }}\n]\n\n\
         Every article needs a different headline, different content and a different source URL.",
        query = query.trim(),
    )
}
