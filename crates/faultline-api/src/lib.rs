//! Faultline — HTTP surface for error and log ingestion.
//!
//! Client SDKs post events to `/ingest/{project_id}:{key}/errors|logs`; the
//! dashboard reads events, statistics and groups under `/api/v1`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use faultline_errors::ErrorPayload;
use faultline_logs::LogPayload;

use crate::state::AppState;

/// Assembles every route without middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::ingest::router())
        .nest("/api/v1/errors", routes::events::router::<ErrorPayload>())
        .nest("/api/v1/logs", routes::events::router::<LogPayload>())
        .nest("/api/v1/error-groups", routes::groups::router::<ErrorPayload>())
        .nest("/api/v1/log-groups", routes::groups::router::<LogPayload>())
        .with_state(state)
}
