//! HTTP bindings for the error stream.

use std::sync::Arc;

use faultline_core::error::DomainError;
use faultline_core::query::AttributeFilter;
use faultline_core::repository::{EventRepository, GroupRepository};
use faultline_core::side_channel::encode;
use faultline_errors::{ErrorPatch, ErrorPayload};
use serde::Deserialize;
use serde_json::Value;

use super::stream::Stream;
use crate::state::AppState;

/// Request body for `POST /ingest/{project_key}/errors`.
///
/// JSON-valued attachments accept any JSON: a string is stored as sent,
/// anything else is serialized.
#[derive(Debug, Deserialize)]
pub struct IngestErrorRequest {
    /// Client time in epoch milliseconds.
    pub time: i64,
    /// Error message.
    pub message: String,
    /// Stacktrace.
    pub stacktrace: String,
    /// Source file.
    pub file: String,
    /// Line within `file`.
    pub line: i64,
    pub context: Option<Value>,
    pub ip: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Value>,
    pub query_params: Option<Value>,
    pub body_params: Option<Value>,
    pub cookies: Option<Value>,
    pub session: Option<Value>,
    pub files: Option<Value>,
    pub env: Option<Value>,
}

/// Request body for `PUT /api/v1/errors/{id}`. Absent or empty fields are
/// left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateErrorRequest {
    pub message: Option<String>,
    pub stacktrace: Option<String>,
    pub file: Option<String>,
    pub line: Option<i64>,
    pub context: Option<Value>,
}

impl Stream for ErrorPayload {
    type IngestRequest = IngestErrorRequest;
    type UpdateRequest = UpdateErrorRequest;

    fn events(state: &AppState) -> Arc<dyn EventRepository<Self>> {
        Arc::clone(&state.errors)
    }

    fn groups(state: &AppState) -> Arc<dyn GroupRepository<Self>> {
        Arc::clone(&state.error_groups)
    }

    fn ingest(request: IngestErrorRequest) -> Result<(i64, Self), DomainError> {
        let payload = ErrorPayload {
            message: request.message,
            stacktrace: request.stacktrace,
            file: request.file,
            line: request.line,
            context: encode(request.context),
            ip: request.ip,
            url: request.url,
            method: request.method,
            headers: encode(request.headers),
            query_params: encode(request.query_params),
            body_params: encode(request.body_params),
            cookies: encode(request.cookies),
            session: encode(request.session),
            files: encode(request.files),
            env: encode(request.env),
        };
        Ok((request.time, payload))
    }

    fn patch(request: UpdateErrorRequest) -> Result<ErrorPatch, DomainError> {
        Ok(ErrorPatch {
            message: request.message,
            stacktrace: request.stacktrace,
            file: request.file,
            line: request.line,
            context: encode(request.context),
        })
    }

    fn level_filter(level: Option<&str>) -> Result<Vec<AttributeFilter>, DomainError> {
        match level {
            None => Ok(Vec::new()),
            Some(_) => Err(DomainError::Validation(
                "level filter applies to logs only".into(),
            )),
        }
    }
}
