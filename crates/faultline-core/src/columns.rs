//! Column model shared between the domain payloads and the storage adapters.
//!
//! Error and log payloads describe their persisted fields as a static column
//! list plus a conversion to and from [`SqlValue`]s. Storage adapters bind and
//! read those values without knowing the concrete payload type, which keeps
//! the database driver out of the domain crates.

use std::collections::HashMap;

use crate::error::DomainError;

/// Storage type of a payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `TEXT NOT NULL`.
    Text,
    /// Nullable `TEXT`.
    OptionalText,
    /// `BIGINT NOT NULL`.
    Integer,
}

/// A named, typed payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name, identical in the table and in filter references.
    pub name: &'static str,
    /// Storage type.
    pub ty: ColumnType,
}

impl Column {
    /// Declares a `TEXT NOT NULL` column.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Text,
        }
    }

    /// Declares a nullable `TEXT` column.
    #[must_use]
    pub const fn optional_text(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::OptionalText,
        }
    }

    /// Declares a `BIGINT NOT NULL` column.
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: ColumnType::Integer,
        }
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Value of a [`ColumnType::Text`] column.
    Text(String),
    /// Value of a [`ColumnType::OptionalText`] column.
    OptionalText(Option<String>),
    /// Value of a [`ColumnType::Integer`] column.
    Integer(i64),
}

impl SqlValue {
    /// Renders the value as text for equality filters. `None` for SQL NULL.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::OptionalText(s) => s.clone(),
            Self::Integer(i) => Some(i.to_string()),
        }
    }
}

/// Values read back from one row, keyed by column name.
#[derive(Debug, Default)]
pub struct ColumnValues {
    values: HashMap<&'static str, SqlValue>,
}

impl ColumnValues {
    /// Creates an empty value set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zips a column list with the values produced by [`Columns::to_values`].
    #[must_use]
    pub fn from_pairs(columns: &[Column], values: Vec<SqlValue>) -> Self {
        let mut out = Self::new();
        for (column, value) in columns.iter().zip(values) {
            out.insert(column.name, value);
        }
        out
    }

    /// Stores a value under `name`, replacing any previous one.
    pub fn insert(&mut self, name: &'static str, value: SqlValue) {
        self.values.insert(name, value);
    }

    /// Removes and returns a required text column.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the column is missing or has
    /// another type.
    pub fn take_text(&mut self, name: &str) -> Result<String, DomainError> {
        match self.values.remove(name) {
            Some(SqlValue::Text(s)) => Ok(s),
            other => Err(mismatch(name, "text", other.as_ref())),
        }
    }

    /// Removes and returns a nullable text column.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the column is missing or has
    /// another type.
    pub fn take_optional_text(&mut self, name: &str) -> Result<Option<String>, DomainError> {
        match self.values.remove(name) {
            Some(SqlValue::OptionalText(s)) => Ok(s),
            other => Err(mismatch(name, "optional text", other.as_ref())),
        }
    }

    /// Removes and returns an integer column.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the column is missing or has
    /// another type.
    pub fn take_integer(&mut self, name: &str) -> Result<i64, DomainError> {
        match self.values.remove(name) {
            Some(SqlValue::Integer(i)) => Ok(i),
            other => Err(mismatch(name, "integer", other.as_ref())),
        }
    }
}

fn mismatch(name: &str, expected: &str, found: Option<&SqlValue>) -> DomainError {
    match found {
        None => DomainError::Infrastructure(format!("column {name} missing from row")),
        Some(value) => DomainError::Infrastructure(format!(
            "column {name} expected {expected}, found {value:?}"
        )),
    }
}

/// A type persisted as a fixed list of columns.
pub trait Columns: Sized {
    /// Column list in binding order.
    const COLUMNS: &'static [Column];

    /// Produces one value per entry of [`Columns::COLUMNS`], in the same order.
    fn to_values(&self) -> Vec<SqlValue>;

    /// Rebuilds the value from a row.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a column is missing, has the
    /// wrong type, or holds a value the domain type rejects.
    fn from_values(values: &mut ColumnValues) -> Result<Self, DomainError>;

    /// Returns the column declaration with the given name, if any.
    #[must_use]
    fn column(name: &str) -> Option<Column> {
        Self::COLUMNS.iter().copied().find(|c| c.name == name)
    }

    /// Returns the text rendering of the named column for this value.
    #[must_use]
    fn value_of(&self, name: &str) -> Option<String> {
        Self::COLUMNS
            .iter()
            .position(|c| c.name == name)
            .and_then(|idx| self.to_values().get(idx).and_then(SqlValue::as_text))
    }
}
