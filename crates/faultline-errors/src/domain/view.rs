//! API-facing projection of an error event.

use faultline_core::event::EventRecord;
use faultline_core::side_channel::project;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::event::ErrorPayload;

/// Error event as returned to callers, with side-channel fields decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    /// Event identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Group the event was counted under.
    pub fingerprint: String,
    /// Error message.
    pub message: String,
    /// Stacktrace.
    pub stacktrace: String,
    /// Source file.
    pub file: String,
    /// Line within `file`.
    pub line: i64,
    /// Decoded context.
    pub context: Option<Value>,
    /// Client IP address.
    pub ip: Option<String>,
    /// Request URL.
    pub url: Option<String>,
    /// Request method.
    pub method: Option<String>,
    /// Decoded request headers.
    pub headers: Option<Value>,
    /// Decoded query parameters.
    pub query_params: Option<Value>,
    /// Decoded body parameters.
    pub body_params: Option<Value>,
    /// Decoded cookies.
    pub cookies: Option<Value>,
    /// Decoded session data.
    pub session: Option<Value>,
    /// Decoded file uploads.
    pub files: Option<Value>,
    /// Decoded environment.
    pub env: Option<Value>,
    /// Client-reported time, epoch milliseconds.
    pub time: i64,
}

impl ErrorView {
    /// Projects a stored record. Malformed side-channel text never fails the
    /// projection; it is wrapped under its `PascalCase` field name instead,
    /// the key legacy consumers read.
    #[must_use]
    pub fn from_record(record: &EventRecord<ErrorPayload>) -> Self {
        let p = &record.payload;
        Self {
            id: record.id,
            project_id: record.project_id,
            fingerprint: record.fingerprint.clone(),
            message: p.message.clone(),
            stacktrace: p.stacktrace.clone(),
            file: p.file.clone(),
            line: p.line,
            context: project("Context", p.context.as_deref()),
            ip: p.ip.clone(),
            url: p.url.clone(),
            method: p.method.clone(),
            headers: project("Headers", p.headers.as_deref()),
            query_params: project("QueryParams", p.query_params.as_deref()),
            body_params: project("BodyParams", p.body_params.as_deref()),
            cookies: project("Cookies", p.cookies.as_deref()),
            session: project("Session", p.session.as_deref()),
            files: project("Files", p.files.as_deref()),
            env: project("Env", p.env.as_deref()),
            time: record.time,
        }
    }
}
