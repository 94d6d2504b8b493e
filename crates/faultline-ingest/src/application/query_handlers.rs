//! Query handlers for events and groups.
//!
//! Reads pass straight through to the repositories; event records are
//! projected to their API-facing view on the way out.

use faultline_core::clock::Clock;
use faultline_core::error::DomainError;
use faultline_core::event::EventPayload;
use faultline_core::query::{EventQuery, EventStats, GroupQuery, Listing};
use faultline_core::repository::{EventRepository, GroupOf, GroupRepository};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Retrieves one event by id.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` if no event has the id.
pub async fn get_event_by_id<P: EventPayload>(
    event_id: Uuid,
    repo: &dyn EventRepository<P>,
) -> Result<P::View, DomainError> {
    let record = repo.get_by_id(event_id).await?;
    Ok(P::to_view(&record))
}

/// Lists one page of events together with the total filtered count.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store fails.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn list_events<P: EventPayload>(
    query: &EventQuery,
    repo: &dyn EventRepository<P>,
) -> Result<Listing<P::View>, DomainError> {
    debug!(filter = ?query.filter, page = ?query.page, "listing events");
    let records = repo.get_all(query).await?;
    let count = repo.count(&query.filter).await?;
    Ok(Listing {
        count,
        items: records.iter().map(P::to_view).collect(),
    })
}

/// Counts a project's events over the trailing 24h, 7d and 30d windows,
/// optionally scoped to one group.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store fails.
pub async fn get_event_stats<P: EventPayload>(
    project_id: Uuid,
    fingerprint: Option<&str>,
    clock: &dyn Clock,
    repo: &dyn EventRepository<P>,
) -> Result<EventStats, DomainError> {
    repo.stats(project_id, fingerprint, clock.now_millis()).await
}

/// Retrieves one group by id (its fingerprint).
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if no group has the id.
pub async fn get_group_by_id<P: EventPayload>(
    group_id: &str,
    repo: &dyn GroupRepository<P>,
) -> Result<GroupOf<P>, DomainError> {
    repo.get_by_id(group_id).await
}

/// Lists one page of groups together with the total filtered count.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store fails.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn list_groups<P: EventPayload>(
    query: &GroupQuery,
    repo: &dyn GroupRepository<P>,
) -> Result<Listing<GroupOf<P>>, DomainError> {
    debug!(filter = ?query.filter, page = ?query.page, "listing groups");
    let items = repo.get_all(query).await?;
    let count = repo.count(&query.filter).await?;
    Ok(Listing { count, items })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use faultline_core::event::{EventRecord, Group, GroupStatus};
    use faultline_core::query::{EventFilter, GroupFilter, Page, SortOrder};
    use faultline_logs::{Level, LogPayload};
    use faultline_test_support::{FailingRepository, FixedClock, InMemoryRepository};

    use super::*;

    fn log(message: &str, level: Level) -> LogPayload {
        LogPayload {
            level,
            message: message.to_owned(),
            context: None,
        }
    }

    #[tokio::test]
    async fn test_get_event_by_id_projects_the_record() {
        // Arrange
        let repo = InMemoryRepository::<LogPayload>::new();
        let record = EventRecord::new(Uuid::new_v4(), 100, log("started", Level::Info), 200);
        repo.seed_event(record.clone());

        // Act
        let view = get_event_by_id::<LogPayload>(record.id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.id, record.id);
        assert_eq!(view.level, Level::Info);
        assert_eq!(view.fingerprint, record.fingerprint);
    }

    #[tokio::test]
    async fn test_get_event_by_id_returns_not_found() {
        let repo = InMemoryRepository::<LogPayload>::new();
        let id = Uuid::new_v4();

        let result = get_event_by_id::<LogPayload>(id, &repo).await;

        assert!(matches!(result, Err(DomainError::EventNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_list_events_filters_sorts_and_counts_beyond_the_page() {
        // Arrange
        let project_id = Uuid::new_v4();
        let repo = InMemoryRepository::<LogPayload>::new();
        for (time, message, level) in [
            (10, "Connection reset", Level::Error),
            (20, "connection refused", Level::Error),
            (30, "connection refused", Level::Info),
            (40, "disk full", Level::Error),
        ] {
            repo.seed_event(EventRecord::new(project_id, time, log(message, level), 1));
        }
        repo.seed_event(EventRecord::new(
            Uuid::new_v4(),
            50,
            log("connection refused", Level::Error),
            1,
        ));
        let query = EventQuery {
            filter: EventFilter {
                project_id: Some(project_id),
                search: Some("CONNECTION".to_owned()),
                attributes: vec![Level::Error.filter()],
                ..EventFilter::default()
            },
            page: Page::new(Some(1), Some(0), SortOrder::Asc),
        };

        // Act
        let listing = list_events::<LogPayload>(&query, &repo).await.unwrap();

        // Assert
        assert_eq!(listing.count, 2);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].time, 10);
    }

    #[tokio::test]
    async fn test_list_events_applies_inclusive_time_bounds_newest_first() {
        // Arrange
        let project_id = Uuid::new_v4();
        let repo = InMemoryRepository::<LogPayload>::new();
        for time in [100, 200, 300, 400] {
            repo.seed_event(EventRecord::new(project_id, time, log("tick", Level::Debug), 1));
        }
        let query = EventQuery {
            filter: EventFilter {
                time_from: Some(200),
                time_to: Some(300),
                ..EventFilter::default()
            },
            page: Page::default(),
        };

        // Act
        let listing = list_events::<LogPayload>(&query, &repo).await.unwrap();

        // Assert
        let times: Vec<i64> = listing.items.iter().map(|v| v.time).collect();
        assert_eq!(times, vec![300, 200]);
        assert_eq!(listing.count, 2);
    }

    #[tokio::test]
    async fn test_get_event_stats_counts_cumulative_windows() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(now);
        let project_id = Uuid::new_v4();
        let repo = InMemoryRepository::<LogPayload>::new();
        for ago in [
            Duration::hours(1),
            Duration::days(2),
            Duration::days(10),
            Duration::days(40),
        ] {
            let time = (now - ago).timestamp_millis();
            repo.seed_event(EventRecord::new(project_id, time, log("beat", Level::Info), time));
        }
        repo.seed_event(EventRecord::new(
            Uuid::new_v4(),
            now.timestamp_millis(),
            log("beat", Level::Info),
            0,
        ));

        // Act
        let stats = get_event_stats::<LogPayload>(project_id, None, &clock, &repo).await.unwrap();

        // Assert
        assert_eq!(stats.last_24h, 1);
        assert_eq!(stats.last_7d, 2);
        assert_eq!(stats.last_30d, 3);
    }

    #[tokio::test]
    async fn test_get_event_stats_can_scope_to_one_fingerprint() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(now);
        let project_id = Uuid::new_v4();
        let repo = InMemoryRepository::<LogPayload>::new();
        let time = (now - Duration::hours(2)).timestamp_millis();
        let kept = EventRecord::new(project_id, time, log("beat", Level::Info), time);
        repo.seed_event(kept.clone());
        repo.seed_event(EventRecord::new(project_id, time, log("other", Level::Info), time));

        // Act
        let stats = get_event_stats::<LogPayload>(project_id, Some(&kept.fingerprint), &clock, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(stats.last_24h, 1);
        assert_eq!(stats.last_30d, 1);
    }

    #[tokio::test]
    async fn test_list_groups_filters_on_status_and_orders_by_last_seen() {
        // Arrange
        let project_id = Uuid::new_v4();
        let repo = InMemoryRepository::<LogPayload>::new();
        for (message, last_seen, status) in [
            ("alpha", 300, GroupStatus::Unresolved),
            ("beta", 100, GroupStatus::Unresolved),
            ("gamma", 200, GroupStatus::Resolved),
        ] {
            let record = EventRecord::new(project_id, 1, log(message, Level::Warn), 1);
            let mut group = Group::first_sighting(&record, 1);
            group.last_seen_at = last_seen;
            group.status = status;
            repo.seed_group(group);
        }
        let query = GroupQuery {
            filter: GroupFilter {
                project_id: Some(project_id),
                status: Some(GroupStatus::Unresolved),
                ..GroupFilter::default()
            },
            page: Page::new(None, None, SortOrder::Desc),
        };

        // Act
        let listing = list_groups::<LogPayload>(&query, &repo).await.unwrap();

        // Assert
        let messages: Vec<&str> = listing.items.iter().map(|g| g.message.as_str()).collect();
        assert_eq!(messages, vec!["alpha", "beta"]);
        assert_eq!(listing.count, 2);
    }

    #[tokio::test]
    async fn test_get_group_by_id_returns_not_found() {
        let repo = InMemoryRepository::<LogPayload>::new();

        let result = get_group_by_id::<LogPayload>(&"f".repeat(64), &repo).await;

        assert!(matches!(result, Err(DomainError::GroupNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_events_propagates_store_failure() {
        let result = list_events::<LogPayload>(&EventQuery::default(), &FailingRepository).await;

        match result.unwrap_err() {
            DomainError::Infrastructure(msg) => assert_eq!(msg, "connection refused"),
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }
}
