//! Event read, update and delete routes, mounted once per stream.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use faultline_core::error::DomainError;
use faultline_core::query::{EventStats, Listing};
use faultline_ingest::application::{command_handlers, query_handlers};
use faultline_ingest::domain::commands::{DeleteEvent, UpdateEvent};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::stream::{ListParams, Stream};
use crate::error::ApiError;
use crate::state::AppState;

/// Query string for `GET /stats`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    /// Project to count; required.
    pub project_id: Option<Uuid>,
    /// Restricts the counts to one group.
    pub group_id: Option<String>,
}

/// GET /
#[instrument(skip(state), fields(kind = %P::KIND))]
async fn list_events<P: Stream>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Listing<P::View>>, ApiError> {
    let query = params.event_query::<P>()?;
    let listing = query_handlers::list_events(&query, &*P::events(&state)).await?;
    Ok(Json(listing))
}

/// GET /stats
#[instrument(skip(state), fields(kind = %P::KIND))]
async fn event_stats<P: Stream>(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<EventStats>, ApiError> {
    let project_id = params
        .project_id
        .ok_or_else(|| DomainError::Validation("projectId is required".into()))?;
    let stats = query_handlers::get_event_stats(
        project_id,
        params.group_id.as_deref().filter(|g| !g.is_empty()),
        state.clock.as_ref(),
        &*P::events(&state),
    )
    .await?;
    Ok(Json(stats))
}

/// GET /{id}
async fn get_event<P: Stream>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<P::View>, ApiError> {
    let view = query_handlers::get_event_by_id(id, &*P::events(&state)).await?;
    Ok(Json(view))
}

/// PUT /{id}
#[instrument(skip(state, request), fields(kind = %P::KIND))]
async fn update_event<P: Stream>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<P::UpdateRequest>,
) -> Result<Json<P::View>, ApiError> {
    let command = UpdateEvent::<P> {
        correlation_id: Uuid::new_v4(),
        event_id: id,
        patch: P::patch(request)?,
    };

    info!(correlation_id = %command.correlation_id, "handling update event command");

    let view =
        command_handlers::handle_update_event(command, state.clock.as_ref(), &*P::events(&state))
            .await?;
    Ok(Json(view))
}

/// DELETE /{id}
#[instrument(skip(state), fields(kind = %P::KIND))]
async fn delete_event<P: Stream>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = DeleteEvent {
        correlation_id: Uuid::new_v4(),
        event_id: id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete event command");

    command_handlers::handle_delete_event::<P>(&command, &*P::events(&state)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the event router for stream `P`.
pub fn router<P: Stream>() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events::<P>))
        .route("/stats", get(event_stats::<P>))
        .route(
            "/{id}",
            get(get_event::<P>)
                .put(update_event::<P>)
                .delete(delete_event::<P>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use faultline_core::event::{EventRecord, Group};
    use faultline_errors::ErrorPayload;
    use faultline_logs::{Level, LogPayload};
    use faultline_test_support::{FailingRepository, FixedClock, InMemoryRepository};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const NOW: i64 = 1_768_471_200_000;
    const HOUR: i64 = 60 * 60 * 1000;

    fn app_state_with(logs: &InMemoryRepository<LogPayload>) -> AppState {
        let errors = InMemoryRepository::<ErrorPayload>::new();
        AppState::new(
            Arc::new(FixedClock::at_millis(NOW)),
            Arc::new(errors.clone()),
            Arc::new(errors),
            Arc::new(logs.clone()),
            Arc::new(logs.clone()),
        )
    }

    fn failing_app_state() -> AppState {
        AppState::new(
            Arc::new(FixedClock::at_millis(NOW)),
            Arc::new(FailingRepository),
            Arc::new(FailingRepository),
            Arc::new(FailingRepository),
            Arc::new(FailingRepository),
        )
    }

    fn seed(repo: &InMemoryRepository<LogPayload>, project_id: Uuid, message: &str, time: i64) -> Uuid {
        let record = EventRecord::new(
            project_id,
            time,
            LogPayload {
                level: Level::Error,
                message: message.to_owned(),
                context: Some(r#"{"host":"web-1"}"#.to_owned()),
            },
            time,
        );
        repo.seed_group(Group::first_sighting(&record, time));
        let id = record.id;
        repo.seed_event(record);
        id
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router::<LogPayload>()
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_returns_count_and_projected_items() {
        // Arrange
        let repo = InMemoryRepository::<LogPayload>::new();
        let project_id = Uuid::new_v4();
        seed(&repo, project_id, "worker crashed", NOW - 2 * HOUR);
        seed(&repo, project_id, "worker restarted", NOW - HOUR);
        seed(&repo, Uuid::new_v4(), "other project", NOW);

        // Act
        let (status, json) = send(
            app_state_with(&repo),
            get_request(&format!("/?projectId={project_id}&sort=asc&limit=1")),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["message"], "worker crashed");
        assert_eq!(items[0]["context"], json!({"host": "web-1"}));
        assert_eq!(items[0]["projectId"], project_id.to_string());
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_level_with_400() {
        let repo = InMemoryRepository::<LogPayload>::new();

        let (status, json) = send(app_state_with(&repo), get_request("/?level=LOUD")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_stats_counts_trailing_windows() {
        // Arrange
        let repo = InMemoryRepository::<LogPayload>::new();
        let project_id = Uuid::new_v4();
        seed(&repo, project_id, "recent", NOW - HOUR);
        seed(&repo, project_id, "last week", NOW - 3 * 24 * HOUR);
        seed(&repo, project_id, "last month", NOW - 20 * 24 * HOUR);

        // Act
        let (status, json) = send(
            app_state_with(&repo),
            get_request(&format!("/stats?projectId={project_id}")),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"last24h": 1, "last7d": 2, "last30d": 3}));
    }

    #[tokio::test]
    async fn test_stats_requires_project_id() {
        let repo = InMemoryRepository::<LogPayload>::new();

        let (status, json) = send(app_state_with(&repo), get_request("/stats")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "validation error: projectId is required");
    }

    #[tokio::test]
    async fn test_get_unknown_event_returns_404() {
        let repo = InMemoryRepository::<LogPayload>::new();

        let (status, json) =
            send(app_state_with(&repo), get_request(&format!("/{}", Uuid::new_v4()))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_update_changes_level_and_keeps_message() {
        // Arrange
        let repo = InMemoryRepository::<LogPayload>::new();
        let id = seed(&repo, Uuid::new_v4(), "worker crashed", NOW - HOUR);
        let request = Request::builder()
            .method("PUT")
            .uri(format!("/{id}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"level":"FATAL","message":""}"#))
            .unwrap();

        // Act
        let (status, json) = send(app_state_with(&repo), request).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["level"], "FATAL");
        assert_eq!(json["message"], "worker crashed");
        assert_eq!(repo.events()[0].payload.level, Level::Fatal);
    }

    #[tokio::test]
    async fn test_delete_returns_204_and_keeps_group_counter() {
        // Arrange
        let repo = InMemoryRepository::<LogPayload>::new();
        let id = seed(&repo, Uuid::new_v4(), "worker crashed", NOW - HOUR);
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/{id}"))
            .body(Body::empty())
            .unwrap();

        // Act
        let (status, _) = send(app_state_with(&repo), request).await;

        // Assert
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(repo.events().is_empty());
        assert_eq!(repo.group_count(), 1);
    }

    #[tokio::test]
    async fn test_list_returns_500_when_repository_fails() {
        let (status, json) = send(failing_app_state(), get_request("/")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
