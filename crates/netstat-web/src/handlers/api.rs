//! API proxy handlers for communicating with the statistics backend

use crate::{api_client::UsageFetcher, state::AppState, view::UNAVAILABLE_MESSAGE};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use netstat_core::{DateRange, types::ErrorResponse, utils::parse_compact_date};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Query parameters of the usage proxy, `YYYYMMDD`
#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    /// First day
    pub start_date: Option<String>,
    /// Last day
    pub end_date: Option<String>,
}

impl UsageQuery {
    fn range(&self, default: DateRange) -> netstat_core::Result<DateRange> {
        let start = match &self.start_date {
            Some(start) => parse_compact_date(start)?,
            None => default.start,
        };
        let end = match &self.end_date {
            Some(end) => parse_compact_date(end)?,
            None => default.end,
        };
        Ok(DateRange::new(start, end))
    }
}

/// Aggregated usage for a range, fetched from the statistics API
pub async fn network_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsageQuery>,
) -> Response {
    let default = DateRange::ending_at(state.today(), state.config.dashboard.default_window_days);
    let Ok(range) = query.range(default) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Wrong date format.", "INVALID_DATE")),
        )
            .into_response();
    };

    match state.fetcher.fetch(range).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            error!("Failed to fetch network usage from API: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(UNAVAILABLE_MESSAGE, "DATA_UNAVAILABLE")),
            )
                .into_response()
        }
    }
}

/// Web server health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` when the server answers
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Statistics API the dashboard reads from
    pub api_base_url: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        api_base_url: state.fetcher.base_url().to_string(),
    })
}
