//! `PostgreSQL` implementation of the `GroupRepository` trait.

use std::marker::PhantomData;

use async_trait::async_trait;
use faultline_core::columns::Columns;
use faultline_core::error::DomainError;
use faultline_core::event::{EventPayload, Group, GroupStatus};
use faultline_core::query::{GroupFilter, GroupQuery, like_pattern};
use faultline_core::repository::{GroupOf, GroupRepository};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use crate::row::{column_list, db_error, get, push_attribute_filters, push_page, read_columns};

/// PostgreSQL-backed group repository for one stream.
#[derive(Debug, Clone)]
pub struct PgGroupRepository<P> {
    pool: PgPool,
    _payload: PhantomData<fn() -> P>,
}

impl<P: EventPayload> PgGroupRepository<P> {
    /// Creates a new `PgGroupRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _payload: PhantomData,
        }
    }

    fn select() -> String {
        format!(
            "SELECT id, project_id, message{}, first_seen_at, last_seen_at, counter, status FROM {}",
            column_list(<P::GroupDetails as Columns>::COLUMNS),
            P::KIND.group_table()
        )
    }
}

fn row_to_group<P: EventPayload>(row: &PgRow) -> Result<GroupOf<P>, DomainError> {
    let mut values = read_columns(row, <P::GroupDetails as Columns>::COLUMNS)?;
    let status: String = get(row, "status")?;
    Ok(Group {
        id: get(row, "id")?,
        project_id: get(row, "project_id")?,
        message: get(row, "message")?,
        details: <P::GroupDetails as Columns>::from_values(&mut values)?,
        first_seen_at: get(row, "first_seen_at")?,
        last_seen_at: get(row, "last_seen_at")?,
        counter: get(row, "counter")?,
        status: status.parse().map_err(|_| {
            DomainError::Infrastructure(format!("stored group status is invalid: {status}"))
        })?,
    })
}

fn push_group_filter<P: EventPayload>(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &GroupFilter,
) -> Result<(), DomainError> {
    builder.push(" WHERE TRUE");
    if let Some(project_id) = filter.project_id {
        builder.push(" AND project_id = ").push_bind(project_id);
    }
    if let Some(from) = filter.time_from {
        builder.push(" AND last_seen_at >= ").push_bind(from);
    }
    if let Some(to) = filter.time_to {
        builder.push(" AND last_seen_at <= ").push_bind(to);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND message ILIKE ")
            .push_bind(like_pattern(search));
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    push_attribute_filters::<P::GroupDetails>(builder, &filter.attributes)
}

#[async_trait]
impl<P: EventPayload> GroupRepository<P> for PgGroupRepository<P> {
    async fn get_by_id(&self, id: &str) -> Result<GroupOf<P>, DomainError> {
        let sql = format!("{} WHERE id = $1", Self::select());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&format!("load {} row", P::KIND.group_table()), &e))?
            .ok_or_else(|| DomainError::GroupNotFound(id.to_owned()))?;
        row_to_group::<P>(&row)
    }

    #[instrument(skip_all, fields(kind = %P::KIND))]
    async fn get_all(&self, query: &GroupQuery) -> Result<Vec<GroupOf<P>>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(Self::select());
        push_group_filter::<P>(&mut builder, &query.filter)?;
        push_page(&mut builder, "last_seen_at", &query.page);
        debug!(sql = builder.sql(), "listing groups");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&format!("list {}", P::KIND.group_table()), &e))?;
        rows.iter().map(row_to_group::<P>).collect()
    }

    async fn count(&self, filter: &GroupFilter) -> Result<i64, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {}",
            P::KIND.group_table()
        ));
        push_group_filter::<P>(&mut builder, filter)?;

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(&format!("count {}", P::KIND.group_table()), &e))
    }

    #[instrument(skip(self), fields(kind = %P::KIND))]
    async fn set_status(&self, id: &str, status: GroupStatus) -> Result<(), DomainError> {
        let sql = format!(
            "UPDATE {} SET status = $1 WHERE id = $2",
            P::KIND.group_table()
        );
        let result = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&format!("update {} status", P::KIND.group_table()), &e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::GroupNotFound(id.to_owned()));
        }
        Ok(())
    }
}
