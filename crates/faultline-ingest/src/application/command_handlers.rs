//! Command handlers for event ingestion and group triage.
//!
//! Handlers are free functions taking their collaborators (clock and
//! repositories) as trait objects, so the API wires in PostgreSQL and the
//! tests wire in the in-memory doubles.

use faultline_core::clock::Clock;
use faultline_core::command::Command;
use faultline_core::error::DomainError;
use faultline_core::event::{EventPayload, EventRecord, Group};
use faultline_core::repository::{EventRepository, GroupOf, GroupRepository, IngestUnit};
use tracing::{error, info, instrument};

use crate::domain::commands::{CreateEvent, DeleteEvent, UpdateEvent, UpdateGroupStatus};

async fn write_event<P: EventPayload>(
    unit: &mut dyn IngestUnit<P>,
    group: &GroupOf<P>,
    record: &EventRecord<P>,
) -> Result<(), DomainError> {
    unit.upsert_group(group).await?;
    unit.insert_event(record).await
}

/// Handles the `CreateEvent` command: fingerprints the payload, then upserts
/// the group and inserts the event in one transaction.
///
/// If either write fails the transaction is rolled back and the write error
/// is returned; a failing rollback is logged and does not replace it.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the payload or time is degenerate.
/// Returns `DomainError::Infrastructure` if any transactional step fails.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        project_id = %command.project_id,
    )
)]
pub async fn handle_create_event<P: EventPayload>(
    command: &CreateEvent<P>,
    clock: &dyn Clock,
    repo: &dyn EventRepository<P>,
) -> Result<P::View, DomainError> {
    command.payload.validate()?;
    if command.time <= 0 {
        return Err(DomainError::Validation(
            "time must be a positive epoch millisecond timestamp".into(),
        ));
    }

    let now = clock.now_millis();
    let record = EventRecord::new(command.project_id, command.time, command.payload.clone(), now);
    let group = Group::first_sighting(&record, now);

    let mut unit = repo.begin().await?;
    if let Err(err) = write_event(unit.as_mut(), &group, &record).await {
        if let Err(rollback_err) = unit.rollback().await {
            error!(error = %rollback_err, cause = %err, "rollback after failed ingestion failed");
        }
        return Err(err);
    }
    unit.commit().await?;

    info!(
        event_id = %record.id,
        fingerprint = %record.fingerprint,
        "event ingested"
    );
    Ok(P::to_view(&record))
}

/// Handles the `UpdateEvent` command: applies the non-empty patch fields,
/// recomputes the fingerprint and persists the event. The group the event
/// was originally counted under is left as is.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` if the event does not exist.
/// Returns `DomainError::Validation` if a patch field is invalid.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
    )
)]
pub async fn handle_update_event<P: EventPayload>(
    command: UpdateEvent<P>,
    clock: &dyn Clock,
    repo: &dyn EventRepository<P>,
) -> Result<P::View, DomainError> {
    let mut record = repo.get_by_id(command.event_id).await?;

    record.payload.apply_patch(command.patch)?;
    record.refresh_fingerprint();
    record.updated_at = clock.now_millis();

    repo.update(&record).await?;
    info!(fingerprint = %record.fingerprint, "event updated");
    Ok(P::to_view(&record))
}

/// Handles the `DeleteEvent` command. The owning group keeps its counter.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` if the event does not exist.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
    )
)]
pub async fn handle_delete_event<P: EventPayload>(
    command: &DeleteEvent,
    repo: &dyn EventRepository<P>,
) -> Result<(), DomainError> {
    repo.delete(command.event_id).await?;
    info!(kind = %P::KIND, "event deleted");
    Ok(())
}

/// Handles the `UpdateGroupStatus` command and returns the updated group.
///
/// # Errors
///
/// Returns `DomainError::GroupNotFound` if the group does not exist.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        group_id = %command.group_id,
    )
)]
pub async fn handle_update_group_status<P: EventPayload>(
    command: &UpdateGroupStatus,
    repo: &dyn GroupRepository<P>,
) -> Result<GroupOf<P>, DomainError> {
    repo.set_status(&command.group_id, command.status).await?;
    info!(status = %command.status, "group status updated");
    repo.get_by_id(&command.group_id).await
}
