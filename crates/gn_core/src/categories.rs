use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NewsCategory {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub queries: &'static [&'static str],
}

impl NewsCategory {
    /// The query used when the whole category is fetched.
    pub fn primary_query(&self) -> &'static str {
        self.queries.first().copied().unwrap_or(self.title)
    }
}

pub const CATEGORIES: &[NewsCategory] = &[
    NewsCategory {
        id: "technology",
        title: "Technology & Innovation",
        subtitle: "AI, Breakthroughs, Digital Transformation",
        queries: &[
            "latest technology news artificial intelligence breakthrough today",
            "tech innovation startup funding digital transformation",
            "cybersecurity data privacy technology trends",
        ],
    },
    NewsCategory {
        id: "finance",
        title: "Finance & Economy",
        subtitle: "Markets, Crypto, Economic Indicators",
        queries: &[
            "financial markets stock market cryptocurrency news today",
            "economy inflation interest rates federal reserve",
            "banking fintech investment trends",
        ],
    },
    NewsCategory {
        id: "sports",
        title: "Sports & Competition",
        subtitle: "Global Sports, Championships, Athletes",
        queries: &[
            "sports news today major leagues championship",
            "Olympic games FIFA world cup latest results",
            "athlete transfers records breaking news",
        ],
    },
    NewsCategory {
        id: "science",
        title: "Science & Research",
        subtitle: "Scientific Discoveries, Medical Breakthroughs",
        queries: &[
            "scientific discovery medical breakthrough research",
            "space exploration NASA discoveries",
            "climate science environmental research",
        ],
    },
    NewsCategory {
        id: "global",
        title: "Global Affairs",
        subtitle: "Politics, Climate, International Relations",
        queries: &[
            "global politics international relations diplomacy",
            "climate change environmental policy",
            "world leaders summit conference",
        ],
    },
];

pub fn find(id: &str) -> Option<&'static NewsCategory> {
    CATEGORIES.iter().find(|c| c.id.eq_ignore_ascii_case(id))
}

/// "technology" -> "Technology"
pub fn display_name(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
