//! API-facing projection of a log event.

use faultline_core::event::EventRecord;
use faultline_core::side_channel::project;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::event::LogPayload;
use super::level::Level;

/// Log event as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    /// Event identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Group the event was counted under.
    pub fingerprint: String,
    /// Severity.
    pub level: Level,
    /// Log message.
    pub message: String,
    /// Decoded context; plain-text legacy values are wrapped.
    pub context: Option<Value>,
    /// Client-reported time, epoch milliseconds.
    pub time: i64,
}

impl LogView {
    /// Projects a stored record.
    #[must_use]
    pub fn from_record(record: &EventRecord<LogPayload>) -> Self {
        Self {
            id: record.id,
            project_id: record.project_id,
            fingerprint: record.fingerprint.clone(),
            level: record.payload.level,
            message: record.payload.message.clone(),
            context: project("context", record.payload.context.as_deref()),
            time: record.time,
        }
    }
}
