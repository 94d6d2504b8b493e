//! Log event payload and its partial update.

use faultline_core::columns::{Column, ColumnValues, Columns, SqlValue};
use faultline_core::error::DomainError;
use faultline_core::event::{EventKind, EventPayload, EventRecord};

use super::group::LogGroupDetails;
use super::level::Level;
use super::view::LogView;

/// Fields of a log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPayload {
    /// Severity.
    pub level: Level,
    /// Log message.
    pub message: String,
    /// Free-form context (JSON text).
    pub context: Option<String>,
}

/// Partial update of a log event. Absent fields and blank strings mean
/// "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPatch {
    /// New severity.
    pub level: Option<Level>,
    /// New message.
    pub message: Option<String>,
    /// New context (JSON text).
    pub context: Option<String>,
}

impl Columns for LogPayload {
    const COLUMNS: &'static [Column] = &[
        Column::text("level"),
        Column::text("message"),
        Column::optional_text("context"),
    ];

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.level.as_str().to_owned()),
            SqlValue::Text(self.message.clone()),
            SqlValue::OptionalText(self.context.clone()),
        ]
    }

    fn from_values(values: &mut ColumnValues) -> Result<Self, DomainError> {
        let level = values.take_text("level")?;
        Ok(Self {
            level: level.parse().map_err(|_| {
                DomainError::Infrastructure(format!("stored log level is invalid: {level}"))
            })?,
            message: values.take_text("message")?,
            context: values.take_optional_text("context")?,
        })
    }
}

impl EventPayload for LogPayload {
    type Patch = LogPatch;
    type GroupDetails = LogGroupDetails;
    type View = LogView;

    const KIND: EventKind = EventKind::Log;

    fn message(&self) -> &str {
        &self.message
    }

    fn discriminator_fields(&self) -> Vec<String> {
        vec![self.level.as_str().to_owned()]
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.message.trim().is_empty() {
            return Err(DomainError::Validation("message must not be empty".into()));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: LogPatch) -> Result<(), DomainError> {
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(message) = patch.message.filter(|m| !m.trim().is_empty()) {
            self.message = message;
        }
        if let Some(context) = patch.context.filter(|c| !c.is_empty()) {
            self.context = Some(context);
        }
        Ok(())
    }

    fn group_details(&self) -> LogGroupDetails {
        LogGroupDetails { level: self.level }
    }

    fn to_view(record: &EventRecord<Self>) -> LogView {
        LogView::from_record(record)
    }
}
