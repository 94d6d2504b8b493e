//! Group listing and triage routes, mounted once per stream.

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use faultline_core::event::GroupStatus;
use faultline_core::query::Listing;
use faultline_core::repository::GroupOf;
use faultline_ingest::application::{command_handlers, query_handlers};
use faultline_ingest::domain::commands::UpdateGroupStatus;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::stream::{ListParams, Stream};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for PATCH /{id}/status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// `unresolved`, `resolved` or `ignored`.
    pub status: String,
}

/// GET /
#[instrument(skip(state), fields(kind = %P::KIND))]
async fn list_groups<P: Stream>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Listing<GroupOf<P>>>, ApiError> {
    let query = params.group_query::<P>()?;
    let listing = query_handlers::list_groups(&query, &*P::groups(&state)).await?;
    Ok(Json(listing))
}

/// GET /{id}
async fn get_group<P: Stream>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GroupOf<P>>, ApiError> {
    let group = query_handlers::get_group_by_id(&id, &*P::groups(&state)).await?;
    Ok(Json(group))
}

/// PATCH /{id}/status
#[instrument(skip(state, request), fields(kind = %P::KIND, status = %request.status))]
async fn update_status<P: Stream>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<GroupOf<P>>, ApiError> {
    let command = UpdateGroupStatus {
        correlation_id: Uuid::new_v4(),
        group_id: id,
        status: request.status.parse::<GroupStatus>()?,
    };

    info!(correlation_id = %command.correlation_id, "handling update group status command");

    let group = command_handlers::handle_update_group_status(&command, &*P::groups(&state)).await?;
    Ok(Json(group))
}

/// Returns the group router for stream `P`.
pub fn router<P: Stream>() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups::<P>))
        .route("/{id}", get(get_group::<P>))
        .route("/{id}/status", patch(update_status::<P>))
}
