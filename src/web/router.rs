//! Router configuration for the proxy.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{fetch_content, health, obituaries, readability, rss};
use super::state::AppState;

/// Create the proxy router: the four `/api` endpoints plus `/health`.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/rss", get(rss))
        .route("/obituaries", get(obituaries))
        .route("/readability", get(readability))
        .route("/fetch-content", get(fetch_content));

    Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/health", get(health))
}
