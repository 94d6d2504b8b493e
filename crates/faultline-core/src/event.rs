//! Event and group types shared by the error and log contexts.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::columns::Columns;
use crate::error::DomainError;
use crate::fingerprint::compute_fingerprint;

/// Which event stream a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Application errors with a stacktrace and source location.
    Error,
    /// Log lines with a severity level.
    Log,
}

impl EventKind {
    /// Table holding the individual events.
    #[must_use]
    pub const fn event_table(self) -> &'static str {
        match self {
            Self::Error => "errors",
            Self::Log => "logs",
        }
    }

    /// Table holding one aggregate row per fingerprint.
    #[must_use]
    pub const fn group_table(self) -> &'static str {
        match self {
            Self::Error => "error_groups",
            Self::Log => "log_groups",
        }
    }

    /// Short name used in command types and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "errors",
            Self::Log => "logs",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability interface implemented once per event stream.
///
/// The ingestion pipeline, the storage adapters and the test doubles are all
/// generic over this trait; the concrete error and log payloads only describe
/// their fields, their grouping discriminators and their response shape.
pub trait EventPayload: Columns + Clone + fmt::Debug + Send + Sync + 'static {
    /// Partial update accepted by `Update`.
    type Patch: fmt::Debug + Send + Sync;
    /// Descriptive fields copied into a group on its first occurrence.
    type GroupDetails: Columns + Clone + fmt::Debug + Serialize + Send + Sync + 'static;
    /// API-facing projection of a stored event.
    type View: Serialize + fmt::Debug + Send + 'static;

    /// The stream this payload belongs to.
    const KIND: EventKind;

    /// The event message, before normalisation.
    fn message(&self) -> &str;

    /// Fields that, together with the message and project, decide grouping.
    fn discriminator_fields(&self) -> Vec<String>;

    /// Rejects payloads whose fingerprint-relevant fields are empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the offending field.
    fn validate(&self) -> Result<(), DomainError>;

    /// Applies the non-empty fields of `patch`. Empty strings and zero
    /// values leave the current value in place.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a present field is invalid.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), DomainError>;

    /// Extracts the group's descriptive fields.
    fn group_details(&self) -> Self::GroupDetails;

    /// Maps a stored record to its response entity. Must not fail.
    fn to_view(record: &EventRecord<Self>) -> Self::View;
}

/// Computes the fingerprint of a payload within a project.
#[must_use]
pub fn fingerprint_of<P: EventPayload>(project_id: Uuid, payload: &P) -> String {
    compute_fingerprint(payload.message(), project_id, &payload.discriminator_fields())
}

/// A persisted error or log event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord<P> {
    /// Unique, immutable identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Grouping key; recomputed whenever the payload changes.
    pub fingerprint: String,
    /// Client-reported timestamp in epoch milliseconds.
    pub time: i64,
    /// Server insertion time in epoch milliseconds.
    pub created_at: i64,
    /// Server time of the last update in epoch milliseconds.
    pub updated_at: i64,
    /// Stream-specific fields.
    pub payload: P,
}

impl<P: EventPayload> EventRecord<P> {
    /// Builds a new record with a fresh id and a computed fingerprint.
    #[must_use]
    pub fn new(project_id: Uuid, time: i64, payload: P, now_millis: i64) -> Self {
        let fingerprint = fingerprint_of(project_id, &payload);
        Self {
            id: Uuid::now_v7(),
            project_id,
            fingerprint,
            time,
            created_at: now_millis,
            updated_at: now_millis,
            payload,
        }
    }

    /// Recomputes the fingerprint from the current payload.
    pub fn refresh_fingerprint(&mut self) {
        self.fingerprint = fingerprint_of(self.project_id, &self.payload);
    }
}

/// Triage state of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    /// Default for new groups.
    #[default]
    Unresolved,
    /// Marked fixed by an operator.
    Resolved,
    /// Muted by an operator.
    Ignored,
}

impl GroupStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unresolved" => Ok(Self::Unresolved),
            "resolved" => Ok(Self::Resolved),
            "ignored" => Ok(Self::Ignored),
            other => Err(DomainError::Validation(format!(
                "unknown group status: {other}"
            ))),
        }
    }
}

/// Aggregate of every event sharing a fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group<D> {
    /// The fingerprint.
    pub id: String,
    /// Owning project.
    pub project_id: Uuid,
    /// Message of the first occurrence.
    pub message: String,
    /// Descriptive fields of the first occurrence.
    #[serde(flatten)]
    pub details: D,
    /// Server time of the first occurrence; never changes.
    pub first_seen_at: i64,
    /// Server time of the most recent committed occurrence.
    pub last_seen_at: i64,
    /// Number of events ingested under this fingerprint.
    pub counter: i64,
    /// Triage state.
    pub status: GroupStatus,
}

impl<D> Group<D> {
    /// The row inserted when a fingerprint is seen for the first time.
    pub fn first_sighting<P>(record: &EventRecord<P>, seen_at: i64) -> Self
    where
        P: EventPayload<GroupDetails = D>,
    {
        Self {
            id: record.fingerprint.clone(),
            project_id: record.project_id,
            message: record.payload.message().to_owned(),
            details: record.payload.group_details(),
            first_seen_at: seen_at,
            last_seen_at: seen_at,
            counter: 1,
            status: GroupStatus::Unresolved,
        }
    }
}
