use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use gn_core::SearchOptions;
use tokio::sync::RwLock;
use tokio::time::Instant;
use url::form_urlencoded::byte_serialize;

use crate::Sweep;

/// Bumped whenever the key layout changes so entries written under an older
/// layout can never be served.
pub const NEWS_KEY_VERSION: &str = "v2";

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// Long-lived variant for day-level reuse.
pub const DAY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            sweep_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) < self.ttl
    }
}

/// Keyed in-memory store with per-entry expiry.
///
/// Expiry is checked lazily on every read; `cleanup` only reclaims memory
/// for entries nobody asks for anymore.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync> TtlCache<T> {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_default_ttl(config.default_ttl)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    pub async fn set(&self, key: impl Into<String>, data: T, ttl: Option<Duration>) {
        let entry = CacheEntry {
            data,
            timestamp: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_valid_at(now) => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }
        // Re-check under the write lock, a fresh value may have landed meanwhile
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_valid_at(now) => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!("Cache entry expired: {}", key);
                None
            }
            None => None,
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drops every entry, returning how many were held.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }

    /// Removes expired entries and returns how many were dropped.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        before - entries.len()
    }

    /// Entry count, including expired entries not yet reclaimed.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> Sweep for TtlCache<T> {
    fn label(&self) -> &'static str {
        "cache"
    }

    async fn sweep(&self) -> usize {
        self.cleanup().await
    }
}

fn encode(part: &str) -> String {
    byte_serialize(part.as_bytes()).collect()
}

/// Deterministic key for a news lookup.
///
/// Every component is form-encoded so separators inside a query or city name
/// cannot make two different requests share a key.
pub fn news_cache_key(query: &str, category: &str, options: &SearchOptions) -> String {
    let location = match options.location.as_ref().and_then(|l| l.for_search()) {
        Some(location) => [&location.country, &location.city, &location.region]
            .iter()
            .map(|field| encode(field.as_deref().unwrap_or("")))
            .collect::<Vec<_>>()
            .join(","),
        None => "global".to_string(),
    };
    format!(
        "news:{}:{}:{}:{}:{}:{}",
        NEWS_KEY_VERSION,
        encode(query),
        encode(category),
        location,
        options.search_context_size,
        options.max_articles
    )
}
