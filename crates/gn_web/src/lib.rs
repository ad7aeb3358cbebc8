use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/news", post(handlers::search_news))
        .route("/api/news/all", get(handlers::all_news))
        .route(
            "/api/settings",
            get(handlers::get_settings)
                .put(handlers::update_settings)
                .delete(handlers::reset_settings),
        )
        .route("/api/cache", delete(handlers::clear_cache))
        .route("/api/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState};
    pub use gn_core::{Error, NewsResponse, Result};
}
