//! Shipping quote and package tracking backend.

pub mod cache;
pub mod config;
pub mod error;
pub mod labels;
pub mod quoting;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::cache::AppCache;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            cache: AppCache::new(),
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/admin/cache/stats", get(routes::system::cache_stats))
        .route("/admin/cache/invalidate", post(routes::system::invalidate_cache))
        .nest("/api", quoting::router())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
