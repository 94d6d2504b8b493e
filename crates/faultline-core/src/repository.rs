//! Repository abstractions for events and their group aggregates.
//!
//! Ingestion writes go through an [`IngestUnit`]: a transaction in which the
//! group upsert and the event insert either both commit or neither does.
//! Dropping a unit without committing must roll it back, so a cancelled
//! request never leaves a partial group bump behind.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{EventPayload, EventRecord, Group, GroupStatus};
use crate::query::{EventFilter, EventQuery, EventStats, GroupFilter, GroupQuery};

/// Group row type for a payload.
pub type GroupOf<P> = Group<<P as EventPayload>::GroupDetails>;

/// One atomic ingestion write.
#[async_trait]
pub trait IngestUnit<P: EventPayload>: Send {
    /// Inserts `group` with `counter = 1`, or, if a row with the same id
    /// exists, increments its counter by exactly one and advances
    /// `last_seen_at`. Every other column of an existing row is left
    /// untouched. Must be a single atomic conditional upsert.
    async fn upsert_group(&mut self, group: &GroupOf<P>) -> Result<(), DomainError>;

    /// Inserts the event row.
    async fn insert_event(&mut self, event: &EventRecord<P>) -> Result<(), DomainError>;

    /// Makes both writes visible.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discards both writes.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// Event persistence and queries for one stream.
#[async_trait]
pub trait EventRepository<P: EventPayload>: Send + Sync {
    /// Starts an ingestion transaction.
    async fn begin(&self) -> Result<Box<dyn IngestUnit<P>>, DomainError>;

    /// Overwrites the mutable columns of an event.
    /// Returns `DomainError::EventNotFound` if no row matched.
    async fn update(&self, event: &EventRecord<P>) -> Result<(), DomainError>;

    /// Removes an event. Returns `DomainError::EventNotFound` if no row
    /// matched. The owning group is not adjusted.
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    /// Loads one event. Returns `DomainError::EventNotFound` if absent.
    async fn get_by_id(&self, id: Uuid) -> Result<EventRecord<P>, DomainError>;

    /// Loads one page of events, sorted on event time.
    async fn get_all(&self, query: &EventQuery) -> Result<Vec<EventRecord<P>>, DomainError>;

    /// Counts events matching `filter`, ignoring pagination.
    async fn count(&self, filter: &EventFilter) -> Result<i64, DomainError>;

    /// Counts a project's events (optionally one fingerprint's) whose time
    /// falls within the trailing 24h/7d/30d windows ending at `now_millis`.
    async fn stats(
        &self,
        project_id: Uuid,
        fingerprint: Option<&str>,
        now_millis: i64,
    ) -> Result<EventStats, DomainError>;
}

/// Group aggregate queries and triage for one stream.
#[async_trait]
pub trait GroupRepository<P: EventPayload>: Send + Sync {
    /// Loads one group. Returns `DomainError::GroupNotFound` if absent.
    async fn get_by_id(&self, id: &str) -> Result<GroupOf<P>, DomainError>;

    /// Loads one page of groups, sorted on `last_seen_at`.
    async fn get_all(&self, query: &GroupQuery) -> Result<Vec<GroupOf<P>>, DomainError>;

    /// Counts groups matching `filter`, ignoring pagination.
    async fn count(&self, filter: &GroupFilter) -> Result<i64, DomainError>;

    /// Sets the triage status. Returns `DomainError::GroupNotFound` if no
    /// row matched. Never touches the counter or the seen timestamps.
    async fn set_status(&self, id: &str, status: GroupStatus) -> Result<(), DomainError>;
}
