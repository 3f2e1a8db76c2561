//! HTTP request handlers

pub mod chart;
pub mod device;
pub mod health;

use axum::Json;
use serde_json::{Value, json};

/// `GET /` and `HEAD /` under the API prefix
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
