//! FreeMobile Netstat statistics API server library

#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use netstat_core::{Config, context_error, context_error::Result};
use netstat_database::PgPool;
use std::sync::Arc;

/// Build the API router with all routes
///
/// # Errors
///
/// Returns an error if the configured timezone is unknown or the API prefix
/// is not an absolute, non-root path.
pub fn build_router(config: Config, pool: PgPool) -> Result<Router> {
    let state = Arc::new(AppState::new(config, pool)?);
    build_router_with_state(state)
}

/// Build the API router around an existing state
///
/// # Errors
///
/// Returns an error if the API prefix is not an absolute, non-root path.
pub fn build_router_with_state(state: Arc<AppState>) -> Result<Router> {
    let prefix = state.config.server.api_prefix.clone();
    if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
        return Err(context_error!("Invalid API prefix: {:?}", prefix));
    }
    Ok(routes::build_router(&prefix).with_state(state))
}
