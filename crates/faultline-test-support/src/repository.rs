//! Test repositories: in-memory and always-failing implementations of the
//! event and group repository traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use faultline_core::columns::Columns;
use faultline_core::error::DomainError;
use faultline_core::event::{EventPayload, EventRecord, GroupStatus};
use faultline_core::query::{
    EventFilter, EventQuery, EventStats, GroupFilter, GroupQuery, Page, SortOrder,
    WINDOW_7D_MS, WINDOW_24H_MS, WINDOW_30D_MS, matches_search,
};
use faultline_core::repository::{EventRepository, GroupOf, GroupRepository, IngestUnit};
use uuid::Uuid;

#[derive(Debug)]
struct Tables<P: EventPayload> {
    events: HashMap<Uuid, EventRecord<P>>,
    groups: HashMap<String, GroupOf<P>>,
}

impl<P: EventPayload> Default for Tables<P> {
    fn default() -> Self {
        Self {
            events: HashMap::new(),
            groups: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_event_insert: AtomicBool,
    fail_rollback: AtomicBool,
    rollbacks: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A transactional in-memory repository for one event stream.
///
/// Writes made through an [`IngestUnit`] are staged and only applied, all at
/// once and under a single lock, when the unit commits. Rolling back or
/// dropping the unit discards them. Clones share the same tables.
#[derive(Debug, Clone)]
pub struct InMemoryRepository<P: EventPayload> {
    tables: Arc<Mutex<Tables<P>>>,
    faults: Arc<Faults>,
}

impl<P: EventPayload> Default for InMemoryRepository<P> {
    fn default() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            faults: Arc::new(Faults::default()),
        }
    }
}

impl<P: EventPayload> InMemoryRepository<P> {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_event` fail with an infrastructure
    /// error.
    pub fn fail_event_inserts(&self) {
        self.faults.fail_event_insert.store(true, Ordering::SeqCst);
    }

    /// Makes every subsequent `rollback` fail after discarding its writes.
    pub fn fail_rollbacks(&self) {
        self.faults.fail_rollback.store(true, Ordering::SeqCst);
    }

    /// Number of rollbacks requested so far.
    #[must_use]
    pub fn rollback_count(&self) -> usize {
        self.faults.rollbacks.load(Ordering::SeqCst)
    }

    /// Inserts an event directly, bypassing ingestion and grouping.
    pub fn seed_event(&self, record: EventRecord<P>) {
        lock(&self.tables).events.insert(record.id, record);
    }

    /// Inserts a group directly.
    pub fn seed_group(&self, group: GroupOf<P>) {
        lock(&self.tables).groups.insert(group.id.clone(), group);
    }

    /// Snapshot of a committed group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<GroupOf<P>> {
        lock(&self.tables).groups.get(id).cloned()
    }

    /// Snapshot of all committed events, in no particular order.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord<P>> {
        lock(&self.tables).events.values().cloned().collect()
    }

    /// Number of committed groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        lock(&self.tables).groups.len()
    }
}

struct InMemoryUnit<P: EventPayload> {
    tables: Arc<Mutex<Tables<P>>>,
    faults: Arc<Faults>,
    groups: Vec<GroupOf<P>>,
    events: Vec<EventRecord<P>>,
}

#[async_trait]
impl<P: EventPayload> IngestUnit<P> for InMemoryUnit<P> {
    async fn upsert_group(&mut self, group: &GroupOf<P>) -> Result<(), DomainError> {
        self.groups.push(group.clone());
        Ok(())
    }

    async fn insert_event(&mut self, event: &EventRecord<P>) -> Result<(), DomainError> {
        if self.faults.fail_event_insert.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure(format!(
                "failed to insert {} event: injected fault",
                P::KIND
            )));
        }
        self.events.push(event.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let Self {
            tables,
            groups,
            events,
            ..
        } = *self;
        let mut tables = lock(&tables);

        if let Some(dup) = events.iter().find(|e| tables.events.contains_key(&e.id)) {
            return Err(DomainError::Infrastructure(format!(
                "duplicate event id {}",
                dup.id
            )));
        }
        for group in groups {
            let seen_at = group.last_seen_at;
            tables
                .groups
                .entry(group.id.clone())
                .and_modify(|existing| {
                    existing.counter += 1;
                    existing.last_seen_at = existing.last_seen_at.max(seen_at);
                })
                .or_insert(group);
        }
        for event in events {
            tables.events.insert(event.id, event);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.faults.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_rollback.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure(
                "rollback failed: injected fault".into(),
            ));
        }
        Ok(())
    }
}

fn event_matches<P: EventPayload>(event: &EventRecord<P>, filter: &EventFilter) -> bool {
    filter.project_id.is_none_or(|p| event.project_id == p)
        && filter
            .fingerprint
            .as_deref()
            .is_none_or(|fp| event.fingerprint == fp)
        && filter.time_from.is_none_or(|t| event.time >= t)
        && filter.time_to.is_none_or(|t| event.time <= t)
        && filter
            .search
            .as_deref()
            .is_none_or(|s| matches_search(event.payload.message(), s))
        && filter
            .attributes
            .iter()
            .all(|a| event.payload.value_of(a.column).as_deref() == Some(a.value.as_str()))
}

fn group_matches<P: EventPayload>(group: &GroupOf<P>, filter: &GroupFilter) -> bool {
    filter.project_id.is_none_or(|p| group.project_id == p)
        && filter.time_from.is_none_or(|t| group.last_seen_at >= t)
        && filter.time_to.is_none_or(|t| group.last_seen_at <= t)
        && filter
            .search
            .as_deref()
            .is_none_or(|s| matches_search(&group.message, s))
        && filter.status.is_none_or(|s| group.status == s)
        && filter
            .attributes
            .iter()
            .all(|a| group.details.value_of(a.column).as_deref() == Some(a.value.as_str()))
}

fn paginate<T, K: Ord>(mut rows: Vec<T>, page: &Page, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(key);
    if page.sort == SortOrder::Desc {
        rows.reverse();
    }
    let offset = usize::try_from(page.offset).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

fn to_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl<P: EventPayload> EventRepository<P> for InMemoryRepository<P> {
    async fn begin(&self) -> Result<Box<dyn IngestUnit<P>>, DomainError> {
        Ok(Box::new(InMemoryUnit {
            tables: Arc::clone(&self.tables),
            faults: Arc::clone(&self.faults),
            groups: Vec::new(),
            events: Vec::new(),
        }))
    }

    async fn update(&self, event: &EventRecord<P>) -> Result<(), DomainError> {
        let mut tables = lock(&self.tables);
        match tables.events.get_mut(&event.id) {
            Some(slot) => {
                *slot = event.clone();
                Ok(())
            }
            None => Err(DomainError::EventNotFound(event.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        lock(&self.tables)
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::EventNotFound(id))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<EventRecord<P>, DomainError> {
        lock(&self.tables)
            .events
            .get(&id)
            .cloned()
            .ok_or(DomainError::EventNotFound(id))
    }

    async fn get_all(&self, query: &EventQuery) -> Result<Vec<EventRecord<P>>, DomainError> {
        let rows: Vec<_> = lock(&self.tables)
            .events
            .values()
            .filter(|e| event_matches(e, &query.filter))
            .cloned()
            .collect();
        Ok(paginate(rows, &query.page, |e| (e.time, e.id)))
    }

    async fn count(&self, filter: &EventFilter) -> Result<i64, DomainError> {
        let n = lock(&self.tables)
            .events
            .values()
            .filter(|e| event_matches(e, filter))
            .count();
        Ok(to_count(n))
    }

    async fn stats(
        &self,
        project_id: Uuid,
        fingerprint: Option<&str>,
        now_millis: i64,
    ) -> Result<EventStats, DomainError> {
        let tables = lock(&self.tables);
        let times: Vec<i64> = tables
            .events
            .values()
            .filter(|e| e.project_id == project_id)
            .filter(|e| fingerprint.is_none_or(|fp| e.fingerprint == fp))
            .map(|e| e.time)
            .collect();
        let within = |window: i64| {
            to_count(times.iter().filter(|t| **t >= now_millis - window).count())
        };
        Ok(EventStats {
            last_24h: within(WINDOW_24H_MS),
            last_7d: within(WINDOW_7D_MS),
            last_30d: within(WINDOW_30D_MS),
        })
    }
}

#[async_trait]
impl<P: EventPayload> GroupRepository<P> for InMemoryRepository<P> {
    async fn get_by_id(&self, id: &str) -> Result<GroupOf<P>, DomainError> {
        self.group(id)
            .ok_or_else(|| DomainError::GroupNotFound(id.to_owned()))
    }

    async fn get_all(&self, query: &GroupQuery) -> Result<Vec<GroupOf<P>>, DomainError> {
        let rows: Vec<_> = lock(&self.tables)
            .groups
            .values()
            .filter(|g| group_matches::<P>(g, &query.filter))
            .cloned()
            .collect();
        Ok(paginate(rows, &query.page, |g| (g.last_seen_at, g.id.clone())))
    }

    async fn count(&self, filter: &GroupFilter) -> Result<i64, DomainError> {
        let n = lock(&self.tables)
            .groups
            .values()
            .filter(|g| group_matches::<P>(g, filter))
            .count();
        Ok(to_count(n))
    }

    async fn set_status(&self, id: &str, status: GroupStatus) -> Result<(), DomainError> {
        let mut tables = lock(&self.tables);
        match tables.groups.get_mut(id) {
            Some(group) => {
                group.status = status;
                Ok(())
            }
            None => Err(DomainError::GroupNotFound(id.to_owned())),
        }
    }
}

fn connection_refused() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

/// A repository whose every operation fails with an infrastructure error.
/// Useful for testing error-handling paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRepository;

#[async_trait]
impl<P: EventPayload> EventRepository<P> for FailingRepository {
    async fn begin(&self) -> Result<Box<dyn IngestUnit<P>>, DomainError> {
        Err(connection_refused())
    }

    async fn update(&self, _event: &EventRecord<P>) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn delete(&self, _id: Uuid) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn get_by_id(&self, _id: Uuid) -> Result<EventRecord<P>, DomainError> {
        Err(connection_refused())
    }

    async fn get_all(&self, _query: &EventQuery) -> Result<Vec<EventRecord<P>>, DomainError> {
        Err(connection_refused())
    }

    async fn count(&self, _filter: &EventFilter) -> Result<i64, DomainError> {
        Err(connection_refused())
    }

    async fn stats(
        &self,
        _project_id: Uuid,
        _fingerprint: Option<&str>,
        _now_millis: i64,
    ) -> Result<EventStats, DomainError> {
        Err(connection_refused())
    }
}

#[async_trait]
impl<P: EventPayload> GroupRepository<P> for FailingRepository {
    async fn get_by_id(&self, _id: &str) -> Result<GroupOf<P>, DomainError> {
        Err(connection_refused())
    }

    async fn get_all(&self, _query: &GroupQuery) -> Result<Vec<GroupOf<P>>, DomainError> {
        Err(connection_refused())
    }

    async fn count(&self, _filter: &GroupFilter) -> Result<i64, DomainError> {
        Err(connection_refused())
    }

    async fn set_status(&self, _id: &str, _status: GroupStatus) -> Result<(), DomainError> {
        Err(connection_refused())
    }
}
