//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use faultline_core::clock::Clock;
use faultline_errors::ErrorPayload;
use faultline_logs::LogPayload;
use faultline_store::{PgEventRepository, PgGroupRepository};
use faultline_test_support::FixedClock;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use faultline_api::state::AppState;

/// Server time every integration test runs at: 2026-01-15T10:00:00Z.
pub const NOW: i64 = 1_768_471_200_000;

/// One hour in milliseconds.
pub const HOUR: i64 = 60 * 60 * 1000;

/// Build the full app router over real `PostgreSQL` repositories and a fixed
/// clock. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_at(pool, NOW)
}

/// Like [`build_test_app`], with the clock frozen at `now_millis`.
pub fn build_test_app_at(pool: PgPool, now_millis: i64) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_millis(now_millis));
    let app_state = AppState::new(
        clock,
        Arc::new(PgEventRepository::<ErrorPayload>::new(pool.clone())),
        Arc::new(PgGroupRepository::<ErrorPayload>::new(pool.clone())),
        Arc::new(PgEventRepository::<LogPayload>::new(pool.clone())),
        Arc::new(PgGroupRepository::<LogPayload>::new(pool)),
    );
    faultline_api::app(app_state)
}

/// Send a request with an optional JSON body and return the status and the
/// decoded body (`Null` when the body is empty).
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send_json(app, "GET", uri, None).await
}
