//! HTTP bindings for the log stream.

use std::sync::Arc;

use faultline_core::error::DomainError;
use faultline_core::query::AttributeFilter;
use faultline_core::repository::{EventRepository, GroupRepository};
use faultline_core::side_channel::encode_value;
use faultline_logs::{Level, LogPatch, LogPayload};
use serde::Deserialize;
use serde_json::Value;

use super::stream::Stream;
use crate::state::AppState;

/// Request body for `POST /ingest/{project_key}/logs`.
#[derive(Debug, Deserialize)]
pub struct IngestLogRequest {
    /// Client time in epoch milliseconds.
    pub time: i64,
    /// One of `DEBUG`, `INFO`, `WARN`, `ERROR`, `FATAL`.
    pub level: String,
    /// Log message.
    pub message: String,
    /// Free-form context; any JSON value, strings included.
    pub context: Option<Value>,
}

/// Request body for `PUT /api/v1/logs/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLogRequest {
    pub level: Option<String>,
    pub message: Option<String>,
    pub context: Option<Value>,
}

impl Stream for LogPayload {
    type IngestRequest = IngestLogRequest;
    type UpdateRequest = UpdateLogRequest;

    fn events(state: &AppState) -> Arc<dyn EventRepository<Self>> {
        Arc::clone(&state.logs)
    }

    fn groups(state: &AppState) -> Arc<dyn GroupRepository<Self>> {
        Arc::clone(&state.log_groups)
    }

    fn ingest(request: IngestLogRequest) -> Result<(i64, Self), DomainError> {
        let payload = LogPayload {
            level: request.level.parse()?,
            message: request.message,
            context: encode_value(request.context),
        };
        Ok((request.time, payload))
    }

    fn patch(request: UpdateLogRequest) -> Result<LogPatch, DomainError> {
        let level = request
            .level
            .filter(|l| !l.is_empty())
            .map(|l| l.parse::<Level>())
            .transpose()?;
        Ok(LogPatch {
            level,
            message: request.message,
            context: encode_value(request.context),
        })
    }

    fn level_filter(level: Option<&str>) -> Result<Vec<AttributeFilter>, DomainError> {
        level
            .map(|l| l.parse::<Level>().map(Level::filter))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ingest_rejects_unknown_level() {
        let request: IngestLogRequest = serde_json::from_value(json!({
            "time": 1,
            "level": "NOTICE",
            "message": "disk almost full"
        }))
        .unwrap();

        let err = LogPayload::ingest(request).unwrap_err();

        assert!(matches!(err, DomainError::Validation(msg) if msg == "invalid log level: NOTICE"));
    }

    #[test]
    fn test_patch_ignores_empty_level_and_parses_the_rest() {
        let empty = LogPayload::patch(UpdateLogRequest {
            level: Some(String::new()),
            ..UpdateLogRequest::default()
        })
        .unwrap();
        let fatal = LogPayload::patch(UpdateLogRequest {
            level: Some("FATAL".into()),
            context: Some(json!({"host": "db-1"})),
            ..UpdateLogRequest::default()
        })
        .unwrap();

        assert_eq!(empty.level, None);
        assert_eq!(fatal.level, Some(Level::Fatal));
        assert_eq!(fatal.context.as_deref(), Some(r#"{"host":"db-1"}"#));
    }

    #[test]
    fn test_ingest_stores_string_context_as_json_text() {
        let request: IngestLogRequest = serde_json::from_value(json!({
            "time": 1,
            "level": "INFO",
            "message": "session opened",
            "context": "user logged in"
        }))
        .unwrap();

        let (_, payload) = LogPayload::ingest(request).unwrap();

        assert_eq!(payload.context.as_deref(), Some(r#""user logged in""#));
    }

    #[test]
    fn test_level_filter_accepts_known_levels_only() {
        assert!(LogPayload::level_filter(None).unwrap().is_empty());
        assert_eq!(
            LogPayload::level_filter(Some("ERROR")).unwrap(),
            vec![Level::Error.filter()]
        );
        assert!(LogPayload::level_filter(Some("error")).is_err());
    }
}
