//! Error event payload and its partial update.

use faultline_core::columns::{Column, ColumnValues, Columns, SqlValue};
use faultline_core::error::DomainError;
use faultline_core::event::{EventKind, EventPayload, EventRecord};

use super::group::ErrorGroupDetails;
use super::view::ErrorView;

/// Fields of an error event. Side-channel fields hold JSON-encoded text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Human-readable error message.
    pub message: String,
    /// Full stacktrace.
    pub stacktrace: String,
    /// Source file the error was raised in.
    pub file: String,
    /// Line within `file`.
    pub line: i64,
    /// Free-form context (JSON text).
    pub context: Option<String>,
    /// Client IP address.
    pub ip: Option<String>,
    /// Request URL.
    pub url: Option<String>,
    /// Request method.
    pub method: Option<String>,
    /// Request headers (JSON text).
    pub headers: Option<String>,
    /// Query parameters (JSON text).
    pub query_params: Option<String>,
    /// Body parameters (JSON text).
    pub body_params: Option<String>,
    /// Cookies (JSON text).
    pub cookies: Option<String>,
    /// Session data (JSON text).
    pub session: Option<String>,
    /// Uploaded files (JSON text).
    pub files: Option<String>,
    /// Environment variables (JSON text).
    pub env: Option<String>,
}

/// Partial update of an error event.
///
/// Absent fields, blank strings and a zero line mean "no change"; a field
/// cannot be cleared through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPatch {
    /// New message.
    pub message: Option<String>,
    /// New stacktrace.
    pub stacktrace: Option<String>,
    /// New source file.
    pub file: Option<String>,
    /// New line.
    pub line: Option<i64>,
    /// New context (JSON text).
    pub context: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

impl Columns for ErrorPayload {
    const COLUMNS: &'static [Column] = &[
        Column::text("message"),
        Column::text("stacktrace"),
        Column::text("file"),
        Column::integer("line"),
        Column::optional_text("context"),
        Column::optional_text("ip"),
        Column::optional_text("url"),
        Column::optional_text("method"),
        Column::optional_text("headers"),
        Column::optional_text("query_params"),
        Column::optional_text("body_params"),
        Column::optional_text("cookies"),
        Column::optional_text("session"),
        Column::optional_text("files"),
        Column::optional_text("env"),
    ];

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.message.clone()),
            SqlValue::Text(self.stacktrace.clone()),
            SqlValue::Text(self.file.clone()),
            SqlValue::Integer(self.line),
            SqlValue::OptionalText(self.context.clone()),
            SqlValue::OptionalText(self.ip.clone()),
            SqlValue::OptionalText(self.url.clone()),
            SqlValue::OptionalText(self.method.clone()),
            SqlValue::OptionalText(self.headers.clone()),
            SqlValue::OptionalText(self.query_params.clone()),
            SqlValue::OptionalText(self.body_params.clone()),
            SqlValue::OptionalText(self.cookies.clone()),
            SqlValue::OptionalText(self.session.clone()),
            SqlValue::OptionalText(self.files.clone()),
            SqlValue::OptionalText(self.env.clone()),
        ]
    }

    fn from_values(values: &mut ColumnValues) -> Result<Self, DomainError> {
        Ok(Self {
            message: values.take_text("message")?,
            stacktrace: values.take_text("stacktrace")?,
            file: values.take_text("file")?,
            line: values.take_integer("line")?,
            context: values.take_optional_text("context")?,
            ip: values.take_optional_text("ip")?,
            url: values.take_optional_text("url")?,
            method: values.take_optional_text("method")?,
            headers: values.take_optional_text("headers")?,
            query_params: values.take_optional_text("query_params")?,
            body_params: values.take_optional_text("body_params")?,
            cookies: values.take_optional_text("cookies")?,
            session: values.take_optional_text("session")?,
            files: values.take_optional_text("files")?,
            env: values.take_optional_text("env")?,
        })
    }
}

impl EventPayload for ErrorPayload {
    type Patch = ErrorPatch;
    type GroupDetails = ErrorGroupDetails;
    type View = ErrorView;

    const KIND: EventKind = EventKind::Error;

    fn message(&self) -> &str {
        &self.message
    }

    fn discriminator_fields(&self) -> Vec<String> {
        vec![self.file.clone(), self.line.to_string()]
    }

    fn validate(&self) -> Result<(), DomainError> {
        require("message", &self.message)?;
        require("stacktrace", &self.stacktrace)?;
        require("file", &self.file)?;
        if self.line <= 0 {
            return Err(DomainError::Validation("line must be positive".into()));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: ErrorPatch) -> Result<(), DomainError> {
        if let Some(line) = patch.line.filter(|l| *l != 0) {
            if line < 0 {
                return Err(DomainError::Validation("line must be positive".into()));
            }
            self.line = line;
        }
        if let Some(message) = non_empty(patch.message) {
            self.message = message;
        }
        if let Some(stacktrace) = non_empty(patch.stacktrace) {
            self.stacktrace = stacktrace;
        }
        if let Some(file) = non_empty(patch.file) {
            self.file = file;
        }
        if let Some(context) = non_empty(patch.context) {
            self.context = Some(context);
        }
        Ok(())
    }

    fn group_details(&self) -> ErrorGroupDetails {
        ErrorGroupDetails {
            file: self.file.clone(),
            line: self.line,
        }
    }

    fn to_view(record: &EventRecord<Self>) -> ErrorView {
        ErrorView::from_record(record)
    }
}
