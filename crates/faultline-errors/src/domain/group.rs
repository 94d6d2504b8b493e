//! Descriptive fields of an error group.

use faultline_core::columns::{Column, ColumnValues, Columns, SqlValue};
use faultline_core::error::DomainError;
use serde::Serialize;

/// Source location captured from the first error of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorGroupDetails {
    /// Source file.
    pub file: String,
    /// Line within `file`.
    pub line: i64,
}

impl Columns for ErrorGroupDetails {
    const COLUMNS: &'static [Column] = &[Column::text("file"), Column::integer("line")];

    fn to_values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Text(self.file.clone()), SqlValue::Integer(self.line)]
    }

    fn from_values(values: &mut ColumnValues) -> Result<Self, DomainError> {
        Ok(Self {
            file: values.take_text("file")?,
            line: values.take_integer("line")?,
        })
    }
}
