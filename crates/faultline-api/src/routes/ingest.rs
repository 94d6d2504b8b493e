//! Ingestion endpoints used by client SDKs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use faultline_core::error::DomainError;
use faultline_errors::ErrorPayload;
use faultline_ingest::application::command_handlers;
use faultline_ingest::domain::commands::CreateEvent;
use faultline_logs::LogPayload;
use tracing::{info, instrument};
use uuid::Uuid;

use super::stream::Stream;
use crate::error::ApiError;
use crate::state::AppState;

/// Extracts the project id from a `{project_id}:{public_key}` path segment.
///
/// Both halves must be non-empty. The key itself is not verified.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the segment is malformed or the
/// project id is not a UUID.
pub fn parse_project_key(segment: &str) -> Result<Uuid, DomainError> {
    let invalid = || DomainError::Validation(format!("invalid ingest key: {segment}"));
    let (project_id, key) = segment.split_once(':').ok_or_else(invalid)?;
    if project_id.is_empty() || key.is_empty() {
        return Err(invalid());
    }
    Uuid::parse_str(project_id).map_err(|_| invalid())
}

/// POST /ingest/{project_key}/errors and /logs
#[instrument(skip(state, request), fields(kind = %P::KIND))]
async fn ingest<P: Stream>(
    State(state): State<AppState>,
    Path(project_key): Path<String>,
    Json(request): Json<P::IngestRequest>,
) -> Result<(StatusCode, Json<P::View>), ApiError> {
    let project_id = parse_project_key(&project_key)?;
    let (time, payload) = P::ingest(request)?;
    let command = CreateEvent {
        correlation_id: Uuid::new_v4(),
        project_id,
        time,
        payload,
    };

    info!(correlation_id = %command.correlation_id, "handling create event command");

    let view =
        command_handlers::handle_create_event(&command, state.clock.as_ref(), &*P::events(&state))
            .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the ingestion router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingest/{project_key}/errors", post(ingest::<ErrorPayload>))
        .route("/ingest/{project_key}/logs", post(ingest::<LogPayload>))
}
