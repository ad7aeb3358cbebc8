use std::sync::Arc;

use gn_core::SearchSettings;
use gn_inference::NewsService;
use gn_storage::RateLimiter;
use tokio::sync::RwLock;

pub struct AppState {
    pub service: Arc<NewsService>,
    pub limiter: Arc<RateLimiter>,
    pub settings: RwLock<SearchSettings>,
    pub has_api_key: bool,
}

impl AppState {
    pub fn new(service: Arc<NewsService>, limiter: Arc<RateLimiter>, has_api_key: bool) -> Self {
        Self {
            service,
            limiter,
            settings: RwLock::new(SearchSettings::default()),
            has_api_key,
        }
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = RwLock::new(settings);
        self
    }
}
