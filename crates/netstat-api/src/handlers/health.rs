//! Health check endpoint for monitoring

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Timestamp of the check
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Database connectivity status
    pub database: DatabaseHealth,
    /// Number of cached ranges
    pub cached_ranges: usize,
}

/// Database health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    /// Database connection status
    pub connected: bool,
    /// Open connections in the pool
    pub pool_size: u32,
    /// Idle connections in the pool
    pub idle_connections: usize,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Basic health check for load balancers
///
/// Returns 503 when the database does not answer.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let start_time = std::time::Instant::now();

    if let Err(e) = sqlx::query("SELECT 1").execute(&state.pool).await {
        error!("Database health check failed: {}", e);
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let response_time_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        database: DatabaseHealth {
            connected: true,
            pool_size: state.pool.size(),
            idle_connections: state.pool.num_idle(),
            response_time_ms,
        },
        cached_ranges: state.cache.len(),
    };

    debug!("Health check completed in {}ms", response_time_ms);
    Ok(Json(response))
}
