//! Commands for event ingestion and group triage.

use faultline_core::command::Command;
use faultline_core::event::{EventKind, EventPayload, GroupStatus};
use uuid::Uuid;

/// Command to ingest one event and count it against its group.
#[derive(Debug, Clone)]
pub struct CreateEvent<P: EventPayload> {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The owning project, taken from the ingestion path.
    pub project_id: Uuid,
    /// Client-reported time in epoch milliseconds.
    pub time: i64,
    /// The event fields.
    pub payload: P,
}

impl<P: EventPayload> Command for CreateEvent<P> {
    fn command_type(&self) -> &'static str {
        match P::KIND {
            EventKind::Error => "errors.create",
            EventKind::Log => "logs.create",
        }
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to partially update a stored event.
#[derive(Debug)]
pub struct UpdateEvent<P: EventPayload> {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event identifier.
    pub event_id: Uuid,
    /// Fields to overwrite; empty ones are ignored.
    pub patch: P::Patch,
}

impl<P: EventPayload> Command for UpdateEvent<P> {
    fn command_type(&self) -> &'static str {
        match P::KIND {
            EventKind::Error => "errors.update",
            EventKind::Log => "logs.update",
        }
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete a stored event.
#[derive(Debug, Clone)]
pub struct DeleteEvent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event identifier.
    pub event_id: Uuid,
}

impl Command for DeleteEvent {
    fn command_type(&self) -> &'static str {
        "events.delete"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change the triage status of a group.
#[derive(Debug, Clone)]
pub struct UpdateGroupStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The group identifier (its fingerprint).
    pub group_id: String,
    /// The new status.
    pub status: GroupStatus,
}

impl Command for UpdateGroupStatus {
    fn command_type(&self) -> &'static str {
        "groups.update_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
