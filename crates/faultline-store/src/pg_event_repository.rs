//! `PostgreSQL` implementation of the `EventRepository` trait.

use std::marker::PhantomData;

use async_trait::async_trait;
use faultline_core::columns::Columns;
use faultline_core::error::DomainError;
use faultline_core::event::{EventPayload, EventRecord};
use faultline_core::query::{
    EventFilter, EventQuery, EventStats, WINDOW_7D_MS, WINDOW_24H_MS, WINDOW_30D_MS, like_pattern,
};
use faultline_core::repository::{EventRepository, GroupOf, IngestUnit};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::row::{
    column_list, db_error, get, push_attribute_filters, push_page, push_value, read_columns,
};

const BASE_COLUMNS: &str = "id, project_id, fingerprint, time, created_at, updated_at";

/// PostgreSQL-backed event repository for one stream.
#[derive(Debug, Clone)]
pub struct PgEventRepository<P> {
    pool: PgPool,
    _payload: PhantomData<fn() -> P>,
}

impl<P: EventPayload> PgEventRepository<P> {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _payload: PhantomData,
        }
    }

    fn select() -> String {
        format!(
            "SELECT {BASE_COLUMNS}{} FROM {}",
            column_list(P::COLUMNS),
            P::KIND.event_table()
        )
    }
}

fn row_to_record<P: EventPayload>(row: &PgRow) -> Result<EventRecord<P>, DomainError> {
    let mut values = read_columns(row, P::COLUMNS)?;
    Ok(EventRecord {
        id: get(row, "id")?,
        project_id: get(row, "project_id")?,
        fingerprint: get(row, "fingerprint")?,
        time: get(row, "time")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
        payload: P::from_values(&mut values)?,
    })
}

fn push_event_filter<P: EventPayload>(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &EventFilter,
) -> Result<(), DomainError> {
    builder.push(" WHERE TRUE");
    if let Some(project_id) = filter.project_id {
        builder.push(" AND project_id = ").push_bind(project_id);
    }
    if let Some(fingerprint) = &filter.fingerprint {
        builder.push(" AND fingerprint = ").push_bind(fingerprint.clone());
    }
    if let Some(from) = filter.time_from {
        builder.push(" AND time >= ").push_bind(from);
    }
    if let Some(to) = filter.time_to {
        builder.push(" AND time <= ").push_bind(to);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND message ILIKE ")
            .push_bind(like_pattern(search));
    }
    push_attribute_filters::<P>(builder, &filter.attributes)
}

/// One ingestion transaction. Dropping it without `commit` rolls back.
struct PgIngestUnit<P> {
    tx: Transaction<'static, Postgres>,
    _payload: PhantomData<fn() -> P>,
}

#[async_trait]
impl<P: EventPayload> IngestUnit<P> for PgIngestUnit<P> {
    async fn upsert_group(&mut self, group: &GroupOf<P>) -> Result<(), DomainError> {
        let table = P::KIND.group_table();
        let detail_columns = <P::GroupDetails as Columns>::COLUMNS;
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {table} (id, project_id, message{}, first_seen_at, last_seen_at, counter, status) VALUES (",
            column_list(detail_columns)
        ));
        builder
            .push_bind(group.id.clone())
            .push(", ")
            .push_bind(group.project_id)
            .push(", ")
            .push_bind(group.message.clone());
        for value in group.details.to_values() {
            builder.push(", ");
            push_value(&mut builder, value);
        }
        builder
            .push(", ")
            .push_bind(group.first_seen_at)
            .push(", ")
            .push_bind(group.last_seen_at)
            .push(", ")
            .push_bind(group.counter)
            .push(", ")
            .push_bind(group.status.as_str())
            .push(format!(
                ") ON CONFLICT (id) DO UPDATE SET \
                 counter = {table}.counter + 1, \
                 last_seen_at = GREATEST({table}.last_seen_at, EXCLUDED.last_seen_at)"
            ));

        builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error(&format!("upsert {table} row"), &e))?;
        Ok(())
    }

    async fn insert_event(&mut self, event: &EventRecord<P>) -> Result<(), DomainError> {
        let table = P::KIND.event_table();
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {table} ({BASE_COLUMNS}{}) VALUES (",
            column_list(P::COLUMNS)
        ));
        builder
            .push_bind(event.id)
            .push(", ")
            .push_bind(event.project_id)
            .push(", ")
            .push_bind(event.fingerprint.clone())
            .push(", ")
            .push_bind(event.time)
            .push(", ")
            .push_bind(event.created_at)
            .push(", ")
            .push_bind(event.updated_at);
        for value in event.payload.to_values() {
            builder.push(", ");
            push_value(&mut builder, value);
        }
        builder.push(")");

        builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error(&format!("insert {} event", P::KIND), &e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("commit ingestion transaction", &e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| db_error("roll back ingestion transaction", &e))
    }
}

#[async_trait]
impl<P: EventPayload> EventRepository<P> for PgEventRepository<P> {
    async fn begin(&self) -> Result<Box<dyn IngestUnit<P>>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin ingestion transaction", &e))?;
        Ok(Box::new(PgIngestUnit {
            tx,
            _payload: PhantomData,
        }))
    }

    #[instrument(skip_all, fields(kind = %P::KIND, event_id = %event.id))]
    async fn update(&self, event: &EventRecord<P>) -> Result<(), DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET fingerprint = ",
            P::KIND.event_table()
        ));
        builder
            .push_bind(event.fingerprint.clone())
            .push(", updated_at = ")
            .push_bind(event.updated_at);
        for (column, value) in P::COLUMNS.iter().zip(event.payload.to_values()) {
            builder.push(format!(", {} = ", column.name));
            push_value(&mut builder, value);
        }
        builder.push(" WHERE id = ").push_bind(event.id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&format!("update {} event", P::KIND), &e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::EventNotFound(event.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(kind = %P::KIND))]
    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", P::KIND.event_table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(&format!("delete {} event", P::KIND), &e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::EventNotFound(id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<EventRecord<P>, DomainError> {
        let sql = format!("{} WHERE id = $1", Self::select());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&format!("load {} event", P::KIND), &e))?
            .ok_or(DomainError::EventNotFound(id))?;
        row_to_record::<P>(&row)
    }

    #[instrument(skip_all, fields(kind = %P::KIND))]
    async fn get_all(&self, query: &EventQuery) -> Result<Vec<EventRecord<P>>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(Self::select());
        push_event_filter::<P>(&mut builder, &query.filter)?;
        push_page(&mut builder, "time", &query.page);
        debug!(sql = builder.sql(), "listing events");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(&format!("list {} events", P::KIND), &e))?;
        rows.iter().map(row_to_record::<P>).collect()
    }

    async fn count(&self, filter: &EventFilter) -> Result<i64, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {}",
            P::KIND.event_table()
        ));
        push_event_filter::<P>(&mut builder, filter)?;

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(&format!("count {} events", P::KIND), &e))
    }

    #[instrument(skip(self), fields(kind = %P::KIND))]
    async fn stats(
        &self,
        project_id: Uuid,
        fingerprint: Option<&str>,
        now_millis: i64,
    ) -> Result<EventStats, DomainError> {
        let sql = format!(
            "SELECT \
               COUNT(*) FILTER (WHERE time >= $2) AS last_24h, \
               COUNT(*) FILTER (WHERE time >= $3) AS last_7d, \
               COUNT(*) FILTER (WHERE time >= $4) AS last_30d \
             FROM {} \
             WHERE project_id = $1 AND ($5::TEXT IS NULL OR fingerprint = $5)",
            P::KIND.event_table()
        );
        let row = sqlx::query(&sql)
            .bind(project_id)
            .bind(now_millis - WINDOW_24H_MS)
            .bind(now_millis - WINDOW_7D_MS)
            .bind(now_millis - WINDOW_30D_MS)
            .bind(fingerprint)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(&format!("compute {} stats", P::KIND), &e))?;

        Ok(EventStats {
            last_24h: get(&row, "last_24h")?,
            last_7d: get(&row, "last_7d")?,
            last_30d: get(&row, "last_30d")?,
        })
    }
}
