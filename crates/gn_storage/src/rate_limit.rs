use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::Sweep;

/// Shared bucket for clients whose address could not be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Wall-clock instant at which the current window ends.
    pub reset_time: DateTime<Utc>,
    /// Time left in the current window.
    pub retry_after: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RateLimitStats {
    pub identifiers: usize,
    pub requests: u64,
}

/// Fixed-window request counter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests: config.max_requests,
            window: config.window,
        }
    }

    /// Counts one request against `identifier`. Never fails.
    pub async fn check_limit(&self, identifier: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut requests = self.requests.lock().await;

        let fresh = RateLimitEntry {
            count: 0,
            reset_at: now + self.window,
        };
        let entry = requests.entry(identifier.to_string()).or_insert(fresh);
        if now >= entry.reset_at {
            *entry = fresh;
        }

        if entry.count >= self.max_requests {
            return self.decision(false, 0, entry.reset_at, now);
        }

        entry.count += 1;
        let (count, reset_at) = (entry.count, entry.reset_at);
        self.decision(true, self.max_requests - count, reset_at, now)
    }

    fn decision(&self, allowed: bool, remaining: u32, reset_at: Instant, now: Instant) -> RateLimitDecision {
        let retry_after = reset_at.saturating_duration_since(now);
        let reset_time = chrono::Duration::from_std(retry_after)
            .map(|left| Utc::now() + left)
            .unwrap_or_else(|_| Utc::now());
        RateLimitDecision {
            allowed,
            remaining,
            reset_time,
            retry_after,
        }
    }

    pub async fn reset(&self, identifier: &str) {
        self.requests.lock().await.remove(identifier);
    }

    /// Drops entries whose window has already ended.
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut requests = self.requests.lock().await;
        let before = requests.len();
        requests.retain(|_, entry| now < entry.reset_at);
        before - requests.len()
    }

    pub async fn stats(&self) -> RateLimitStats {
        let requests = self.requests.lock().await;
        RateLimitStats {
            identifiers: requests.len(),
            requests: requests.values().map(|e| u64::from(e.count)).sum(),
        }
    }
}

#[async_trait]
impl Sweep for RateLimiter {
    fn label(&self) -> &'static str {
        "rate limiter"
    }

    async fn sweep(&self) -> usize {
        self.cleanup().await
    }
}
