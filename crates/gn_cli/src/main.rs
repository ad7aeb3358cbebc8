use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gn_core::categories::{self, CATEGORIES};
use gn_core::duration::HumanDuration;
use gn_core::options::validate_max_articles;
use gn_core::{Result, SearchSettings};
use gn_inference::{create_model, Config, NewsService, Orchestrator};
use gn_storage::{spawn_sweeper, CacheConfig, RateLimitConfig, RateLimiter, TtlCache};
use gn_web::{create_app, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "AI news aggregator", long_about = None)]
pub struct Cli {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "OPENAI_API_BASE", default_value = gn_inference::DEFAULT_BASE_URL)]
    api_base: String,
    #[arg(long, default_value = "openai", help = "Model to use for inference. Available models: openai (default), dummy")]
    model: String,
    #[arg(long, default_value = gn_inference::DEFAULT_SEARCH_MODEL)]
    search_model: String,
    #[arg(long, default_value = gn_inference::DEFAULT_CHAT_MODEL)]
    chat_model: String,
    /// Budget for each model call (e.g. 30s, 2m)
    #[arg(long, default_value = "60s")]
    stage_timeout: HumanDuration,
    #[arg(long, env = "CACHE_DURATION_HOURS")]
    cache_hours: Option<u64>,
    /// Cache lifetime, takes precedence over --cache-hours (e.g. 1h, 30m, 1h15m30s)
    #[arg(long)]
    cache_ttl: Option<HumanDuration>,
    #[arg(long, env = "RATE_LIMIT_REQUESTS_PER_HOUR", default_value_t = 60)]
    rate_limit: u32,
    #[arg(long, default_value = "1h")]
    rate_window: HumanDuration,
    #[arg(long, env = "DEFAULT_LOCATION_COUNTRY")]
    country: Option<String>,
    #[arg(long, env = "DEFAULT_LOCATION_CITY")]
    city: Option<String>,
    #[arg(long, env = "DEFAULT_LOCATION_REGION")]
    region: Option<String>,
    #[arg(long, env = "DEFAULT_TIMEZONE")]
    timezone: Option<String>,
    /// Used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Fetch news once and print it as JSON
    Fetch {
        #[arg(long, default_value = "technology")]
        category: String,
        /// Defaults to the category's first catalogue query
        #[arg(long)]
        query: Option<String>,
        /// Fetch every category concurrently
        #[arg(long)]
        all: bool,
        #[arg(long)]
        max_articles: Option<i64>,
    },
    /// List the category catalogue
    Categories,
}

impl Cli {
    fn inference_config(&self) -> Config {
        Config {
            api_key: self.api_key.clone(),
            base_url: self.api_base.clone(),
            model_name: Some(self.model.clone()),
            search_model: self.search_model.clone(),
            chat_model: self.chat_model.clone(),
            stage_timeout: self.stage_timeout.into(),
        }
    }

    fn cache_config(&self) -> CacheConfig {
        let ttl = match (self.cache_ttl, self.cache_hours) {
            (Some(ttl), _) => ttl.into(),
            (None, Some(hours)) => Duration::from_secs(hours * 3600),
            (None, None) => gn_storage::cache::DEFAULT_TTL,
        };
        CacheConfig::default().with_ttl(ttl)
    }

    fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit,
            window: self.rate_window.into(),
            ..Default::default()
        }
    }

    fn settings(&self) -> SearchSettings {
        let mut settings = SearchSettings::default();
        let location = &mut settings.location;
        if self.country.is_some() {
            location.country = self.country.clone();
        }
        if self.city.is_some() {
            location.city = self.city.clone();
        }
        if self.region.is_some() {
            location.region = self.region.clone();
        }
        if self.timezone.is_some() {
            location.timezone = self.timezone.clone();
        }
        settings
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Commands::Categories = cli.command {
        for category in CATEGORIES {
            println!("{:<12} {} ({})", category.id, category.title, category.subtitle);
        }
        return Ok(());
    }

    let config = cli.inference_config();
    let has_api_key = config.has_api_key();
    let model = create_model(&config)?;

    let cache_config = cli.cache_config();
    let cache = Arc::new(TtlCache::new(&cache_config));
    info!("💾 News cache ready (ttl {})", HumanDuration(cache_config.default_ttl));
    let service = Arc::new(NewsService::new(
        Orchestrator::new(model, config.stage_timeout),
        cache.clone(),
    ));
    info!("🧠 Inference model initialized successfully (using {})", service.model_name());
    let settings = cli.settings();

    match cli.command {
        Commands::Serve { ref host, port } => {
            let limits = cli.rate_limit_config();
            let limiter = Arc::new(RateLimiter::new(&limits));
            info!(
                "🚦 Rate limit: {} requests per {}",
                limits.max_requests,
                HumanDuration(limits.window)
            );

            let sweepers = [
                spawn_sweeper(cache.clone(), cache_config.sweep_interval),
                spawn_sweeper(limiter.clone(), limits.sweep_interval),
            ];

            let app = create_app(AppState::new(service, limiter, has_api_key).with_settings(settings)).await;
            let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
            info!("🌐 Listening on http://{}", listener.local_addr()?);
            let served = axum::serve(listener, app).await;

            for sweeper in sweepers {
                sweeper.abort();
            }
            served?;
        }
        Commands::Fetch {
            ref category,
            ref query,
            all,
            max_articles,
        } => {
            let mut options = settings.search_options();
            if let Some(max) = max_articles {
                options.max_articles = validate_max_articles(max)?;
            }

            if all {
                info!("📰 Fetching all {} categories", CATEGORIES.len());
                let responses = service.fetch_all(&options).await;
                println!("{}", serde_json::to_string_pretty(&responses)?);
            } else {
                let query = match query {
                    Some(query) => query.clone(),
                    None => categories::find(category)
                        .map(|c| c.primary_query().to_string())
                        .unwrap_or_else(|| format!("latest {} news", category)),
                };
                info!("📰 Fetching {} news for '{}'", category, query);
                let response = service.fetch(&query, category, &options).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Commands::Categories => {}
    }

    Ok(())
}
