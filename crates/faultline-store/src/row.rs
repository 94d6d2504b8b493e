//! Row decoding and query-building helpers shared by the adapters.

use faultline_core::columns::{Column, ColumnType, ColumnValues, Columns, SqlValue};
use faultline_core::error::DomainError;
use faultline_core::query::{AttributeFilter, Page};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

/// Wraps a driver error with the operation that failed.
pub(crate) fn db_error(action: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("failed to {action}: {err}"))
}

/// Reads one typed column from a row.
pub(crate) fn get<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::Infrastructure(format!("failed to decode column {name}: {e}")))
}

/// Reads every declared column of a row into a value set.
pub(crate) fn read_columns(row: &PgRow, columns: &[Column]) -> Result<ColumnValues, DomainError> {
    let mut values = ColumnValues::new();
    for column in columns {
        let value = match column.ty {
            ColumnType::Text => SqlValue::Text(get(row, column.name)?),
            ColumnType::OptionalText => SqlValue::OptionalText(get(row, column.name)?),
            ColumnType::Integer => SqlValue::Integer(get(row, column.name)?),
        };
        values.insert(column.name, value);
    }
    Ok(values)
}

/// Renders `", col_a, col_b"` for appending to a fixed column prefix.
pub(crate) fn column_list(columns: &[Column]) -> String {
    columns.iter().fold(String::new(), |mut out, column| {
        out.push_str(", ");
        out.push_str(column.name);
        out
    })
}

/// Binds one column value.
pub(crate) fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Text(s) => builder.push_bind(s),
        SqlValue::OptionalText(s) => builder.push_bind(s),
        SqlValue::Integer(i) => builder.push_bind(i),
    };
}

/// Appends `AND column = value` for each filter, refusing columns the type
/// does not declare so a filter can never inject an identifier.
pub(crate) fn push_attribute_filters<C: Columns>(
    builder: &mut QueryBuilder<'_, Postgres>,
    filters: &[AttributeFilter],
) -> Result<(), DomainError> {
    for filter in filters {
        let column = C::column(filter.column).ok_or_else(|| {
            DomainError::Validation(format!("cannot filter on column {}", filter.column))
        })?;
        builder.push(" AND ").push(column.name).push(" = ");
        match column.ty {
            ColumnType::Integer => {
                let value: i64 = filter.value.parse().map_err(|_| {
                    DomainError::Validation(format!(
                        "{} filter must be an integer, got {}",
                        column.name, filter.value
                    ))
                })?;
                builder.push_bind(value);
            }
            ColumnType::Text | ColumnType::OptionalText => {
                builder.push_bind(filter.value.clone());
            }
        }
    }
    Ok(())
}

/// Appends `ORDER BY … LIMIT … OFFSET …`, with `id` as tiebreaker.
pub(crate) fn push_page(builder: &mut QueryBuilder<'_, Postgres>, sort_column: &str, page: &Page) {
    let direction = page.sort.as_sql();
    builder
        .push(format!(" ORDER BY {sort_column} {direction}, id {direction} LIMIT "))
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
}
