use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub mod cache;
pub mod rate_limit;

pub use cache::{news_cache_key, CacheConfig, CacheEntry, TtlCache};
pub use rate_limit::{RateLimitConfig, RateLimitDecision, RateLimitStats, RateLimiter, UNKNOWN_CLIENT};

/// Periodic maintenance over a shared map.
#[async_trait]
pub trait Sweep: Send + Sync {
    fn label(&self) -> &'static str;

    /// Drops stale entries, returning how many were removed.
    async fn sweep(&self) -> usize;
}

/// Runs `target.sweep()` every `every` until the handle is aborted.
pub fn spawn_sweeper<S>(target: Arc<S>, every: Duration) -> JoinHandle<()>
where
    S: Sweep + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = target.sweep().await;
            if removed > 0 {
                tracing::info!("🧹 Swept {} expired {} entries", removed, target.label());
            } else {
                tracing::debug!("🧹 Nothing to sweep in {}", target.label());
            }
        }
    })
}

pub mod prelude {
    pub use super::cache::{news_cache_key, CacheConfig, TtlCache};
    pub use super::rate_limit::{RateLimitConfig, RateLimiter};
    pub use super::{spawn_sweeper, Sweep};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_expired_entries() {
        let cache = Arc::new(TtlCache::with_default_ttl(Duration::from_secs(5)));
        cache.set("stale", 1u8, None).await;
        cache.set("fresh", 2u8, Some(Duration::from_secs(600))).await;

        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(cache.keys().await, vec!["fresh".to_string()]);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_for_rate_limiter() {
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig {
            max_requests: 5,
            window: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(600),
        }));
        limiter.check_limit("a").await;

        let handle = spawn_sweeper(limiter.clone(), Duration::from_secs(600));
        tokio::time::sleep(Duration::from_secs(601)).await;

        assert_eq!(limiter.stats().await.identifiers, 0);
        handle.abort();
    }
}
