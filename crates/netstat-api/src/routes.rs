//! API route definitions

use crate::{handlers, state::AppState};
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

/// Versioned statistics routes, mounted under the API prefix
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::status))
        .route("/device/:device_id", put(handlers::device::register_device))
        .route(
            "/device/:device_id/daily/:date",
            post(handlers::device::upload_daily_stat),
        )
        .route(
            "/chart/network-usage",
            get(handlers::chart::network_usage),
        )
        .route(
            "/chart/daily-network-usage",
            get(handlers::chart::daily_network_usage),
        )
        .layer(CompressionLayer::new())
}

/// Build health check routes
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Combine all routes into a single router
///
/// The status route answers both with and without a trailing slash.
pub fn build_router(api_prefix: &str) -> Router<Arc<AppState>> {
    let prefix = api_prefix.trim_end_matches('/');
    Router::new()
        .route(&format!("{prefix}/"), get(handlers::status))
        .nest(prefix, api_routes())
        .merge(health_routes())
        .fallback(not_found_handler)
}

/// Handle 404 Not Found errors
async fn not_found_handler() -> (axum::http::StatusCode, axum::Json<serde_json::Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "error": "Not Found",
            "code": "ROUTE_NOT_FOUND"
        })),
    )
}
