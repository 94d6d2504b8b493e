//! Descriptive fields of a log group.

use faultline_core::columns::{Column, ColumnValues, Columns, SqlValue};
use faultline_core::error::DomainError;
use serde::Serialize;

use super::level::Level;

/// Level captured from the first log line of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogGroupDetails {
    /// Severity.
    pub level: Level,
}

impl Columns for LogGroupDetails {
    const COLUMNS: &'static [Column] = &[Column::text("level")];

    fn to_values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Text(self.level.as_str().to_owned())]
    }

    fn from_values(values: &mut ColumnValues) -> Result<Self, DomainError> {
        let level = values.take_text("level")?;
        Ok(Self {
            level: level.parse().map_err(|_| {
                DomainError::Infrastructure(format!("stored group level is invalid: {level}"))
            })?,
        })
    }
}
