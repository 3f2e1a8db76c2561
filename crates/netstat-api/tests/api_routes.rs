//! Router level tests
//!
//! Most never reach the database. The device flow tests run against
//! `TEST_DATABASE_URL` and are skipped without it.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::Duration;
use netstat_api::{AppState, build_router_with_state};
use netstat_core::{
    Config, DateRange, UsageStats,
    types::{FourGUsage, GlobalUsage},
    utils::format_compact_date,
};
use netstat_database::Database;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn test_state() -> Arc<AppState> {
    // Points nowhere: any test reaching the database fails loudly
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy("postgresql://nobody@127.0.0.1:1/none")
        .unwrap();
    Arc::new(AppState::new(Config::default(), pool).unwrap())
}

fn app(state: Arc<AppState>) -> Router {
    build_router_with_state(state).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_upload() -> Value {
    json!({
        "timeOnOrange": 1000,
        "timeOnFreeMobile": 3000,
        "timeOnFreeMobile3g": 1000,
        "timeOnFreeMobile4g": 1500,
        "timeOnFreeMobileFemtocell": 500
    })
}

#[tokio::test]
async fn test_status_endpoint() {
    let state = test_state();
    for uri in ["/2", "/2/"] {
        let (status, body) = send(app(state.clone()), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let (status, body) = send(app(test_state()), get("/1/chart/network-usage")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ROUTE_NOT_FOUND");
}

#[tokio::test]
async fn test_network_usage_rejects_malformed_dates() {
    let (status, body) = send(
        app(test_state()),
        get("/2/chart/network-usage?start_date=2024-01-01&end_date=20240107"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Wrong date format.");
}

#[tokio::test]
async fn test_network_usage_rejects_long_ranges() {
    let (status, body) = send(
        app(test_state()),
        get("/2/chart/network-usage?start_date=20240101&end_date=20240201"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Too long date range (maximum is 31 days).");
}

#[tokio::test]
async fn test_network_usage_rejects_reversed_ranges() {
    let (status, _) = send(
        app(test_state()),
        get("/2/chart/network-usage?start_date=20240107&end_date=20240101"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_network_usage_served_from_cache() {
    let state = test_state();
    let range = DateRange::new(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
    );
    let cached = UsageStats {
        stats_global: GlobalUsage {
            users: 42,
            time_on_orange: 10,
            time_on_free_mobile: 20,
            time_on_free_mobile_femtocell: 30,
        },
        stats_4g: FourGUsage {
            users: 7,
            time_on_orange: 1,
            time_on_free_mobile_3g: 2,
            time_on_free_mobile_4g: 3,
            time_on_free_mobile_femtocell: 4,
        },
    };
    state.cache.insert(range.cache_key(), cached, None);

    let (status, body) = send(
        app(state),
        get("/2/chart/network-usage?start_date=20240101&end_date=20240107"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::to_value(cached).unwrap());
}

#[tokio::test]
async fn test_daily_upload_rejects_bad_date() {
    let (status, body) = send(
        app(test_state()),
        post_json("/2/device/abc/daily/2024011", &valid_upload()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Wrong date format.");
}

#[tokio::test]
async fn test_daily_upload_ignores_old_statistics() {
    let state = test_state();
    let old = format_compact_date(state.today() - Duration::days(30));

    let (status, body) = send(
        app(state),
        post_json(&format!("/2/device/abc/daily/{old}"), &valid_upload()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "Ignored.", "reason": "too_old_statistics" })
    );
}

#[tokio::test]
async fn test_daily_upload_rejects_future_statistics() {
    let state = test_state();
    let tomorrow = format_compact_date(state.today() + Duration::days(1));

    let (status, body) = send(
        app(state),
        post_json(&format!("/2/device/abc/daily/{tomorrow}"), &valid_upload()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid statistics.");
}

#[tokio::test]
async fn test_daily_upload_rejects_inconsistent_statistics() {
    let state = test_state();
    let today = format_compact_date(state.today());
    let mut upload = valid_upload();
    upload["timeOnFreeMobile"] = json!(100);

    let (status, body) = send(
        app(state),
        post_json(&format!("/2/device/abc/daily/{today}"), &upload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid statistics.");
}

#[tokio::test]
async fn test_daily_upload_requires_every_counter() {
    let (status, body) = send(
        app(test_state()),
        post_json("/2/device/abc/daily/20240101", &json!({ "timeOnOrange": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You must provide query parameters.");
}

#[tokio::test]
async fn test_daily_upload_rejects_out_of_range_counters() {
    let mut upload = valid_upload();
    upload["timeOnOrange"] = json!(86_400_001);

    let (status, body) = send(
        app(test_state()),
        post_json("/2/device/abc/daily/20240101", &upload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_device_registration_requires_body() {
    let request = Request::builder()
        .method("PUT")
        .uri("/2/device/abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(test_state()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You must provide query parameters.");
}

async fn database_state() -> Option<Arc<AppState>> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = match PgPoolOptions::new().connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            return None;
        }
    };
    if let Err(e) = Database::from_pool(pool.clone()).migrate().await {
        eprintln!("Failed to migrate test database: {e}");
        return None;
    }
    Some(Arc::new(AppState::new(Config::default(), pool).unwrap()))
}

fn unique_identifier() -> String {
    format!("test-{}", Uuid::new_v4().simple())
}

fn put_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn registration() -> Value {
    json!({ "brand": "Google", "model": "Pixel 8" })
}

#[tokio::test]
async fn test_device_registration_conflict() {
    let Some(state) = database_state().await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
        return;
    };
    let uri = format!("/2/device/{}", unique_identifier());

    let (status, body) = send(app(state.clone()), put_json(&uri, &registration())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["brand"], "Google");
    assert_eq!(body["model"], "Pixel 8");

    let (status, body) = send(app(state), put_json(&uri, &registration())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "The provided device id already exists in database."
    );
}

#[tokio::test]
async fn test_daily_upload_for_unknown_device() {
    let Some(state) = database_state().await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
        return;
    };
    let today = format_compact_date(state.today());
    let uri = format!("/2/device/{}/daily/{today}", unique_identifier());

    let (status, body) = send(app(state), post_json(&uri, &valid_upload())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Device not found.");
}

#[tokio::test]
async fn test_daily_upload_stored_once() {
    let Some(state) = database_state().await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set or database not available");
        return;
    };
    let identifier = unique_identifier();
    let (status, _) = send(
        app(state.clone()),
        put_json(&format!("/2/device/{identifier}"), &registration()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let today = format_compact_date(state.today());
    let uri = format!("/2/device/{identifier}/daily/{today}");

    let (status, body) = send(app(state.clone()), post_json(&uri, &valid_upload())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device_identifier"], identifier.as_str());
    assert_eq!(body["date"], today.as_str());
    assert_eq!(body["time_on_orange"], 1000);

    let (status, body) = send(app(state), post_json(&uri, &valid_upload())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Statistics already uploaded." }));
}
