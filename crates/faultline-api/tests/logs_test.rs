//! Integration tests for the log stream.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use common::{HOUR, NOW};

async fn ingest(pool: &PgPool, project_id: Uuid, level: &str, message: &str, time: i64) -> Value {
    let app = common::build_test_app(pool.clone());
    let (status, json) = common::post_json(
        app,
        &format!("/ingest/{project_id}:pk_test/logs"),
        &json!({"time": time, "level": level, "message": message, "context": {"pod": "api-7"}}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "ingest failed: {json}");
    json
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ingest_log_round_trip(pool: PgPool) {
    let project_id = Uuid::new_v4();
    let created = ingest(&pool, project_id, "WARN", "queue depth 912", NOW).await;

    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(
        app,
        &format!("/api/v1/logs/{}", created["id"].as_str().unwrap()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["level"], "WARN");
    assert_eq!(json["message"], "queue depth 912");
    assert_eq!(json["context"], json!({"pod": "api-7"}));
    assert_eq!(json["projectId"], project_id.to_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_level_is_part_of_the_group_key(pool: PgPool) {
    let project_id = Uuid::new_v4();
    let warn = ingest(&pool, project_id, "WARN", "queue depth 912", NOW - HOUR).await;
    let warn_again = ingest(&pool, project_id, "WARN", "queue depth 17", NOW).await;
    let error = ingest(&pool, project_id, "ERROR", "queue depth 912", NOW).await;

    assert_eq!(warn["fingerprint"], warn_again["fingerprint"]);
    assert_ne!(warn["fingerprint"], error["fingerprint"]);

    let app = common::build_test_app(pool);
    let (status, groups) = common::get_json(
        app,
        &format!("/api/v1/log-groups?projectId={project_id}&level=WARN"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(groups["count"], 1);
    assert_eq!(groups["items"][0]["counter"], 2);
    assert_eq!(groups["items"][0]["level"], "WARN");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_filters_on_level_and_time_range(pool: PgPool) {
    let project_id = Uuid::new_v4();
    ingest(&pool, project_id, "ERROR", "disk full", NOW - 3 * HOUR).await;
    let inside = ingest(&pool, project_id, "ERROR", "disk full", NOW - 2 * HOUR).await;
    ingest(&pool, project_id, "INFO", "disk checked", NOW - 2 * HOUR).await;
    ingest(&pool, project_id, "ERROR", "disk full", NOW).await;

    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(
        app,
        &format!(
            "/api/v1/logs?projectId={project_id}&level=ERROR&timeFrom={}&timeTo={}",
            NOW - 2 * HOUR,
            NOW - HOUR
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["items"][0]["id"], inside["id"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_pagination_reports_total_count(pool: PgPool) {
    let project_id = Uuid::new_v4();
    for offset in 0..5 {
        ingest(&pool, project_id, "DEBUG", "tick", NOW - offset * HOUR).await;
    }

    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(
        app,
        &format!("/api/v1/logs?projectId={project_id}&limit=2&offset=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 5);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["time"], NOW - HOUR);
    assert_eq!(items[1]["time"], NOW - 2 * HOUR);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_with_unknown_level_is_rejected(pool: PgPool) {
    let project_id = Uuid::new_v4();
    let created = ingest(&pool, project_id, "INFO", "user signed in", NOW).await;
    let uri = format!("/api/v1/logs/{}", created["id"].as_str().unwrap());

    let app = common::build_test_app(pool.clone());
    let (status, json) =
        common::send_json(app, "PUT", &uri, Some(&json!({"level": "VERBOSE"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "validation error: invalid log level: VERBOSE");

    let app = common::build_test_app(pool);
    let (_, stored) = common::get_json(app, &uri).await;
    assert_eq!(stored["level"], "INFO");
}
