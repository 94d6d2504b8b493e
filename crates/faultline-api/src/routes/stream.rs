//! Per-stream HTTP bindings and the query-string model shared by listings.
//!
//! The event, group and ingest routers are generic over [`Stream`], which
//! ties a payload type to its repositories in [`AppState`] and to the JSON
//! bodies accepted for it.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use faultline_core::error::DomainError;
use faultline_core::event::{EventPayload, GroupStatus};
use faultline_core::query::{
    AttributeFilter, EventFilter, EventQuery, GroupFilter, GroupQuery, Page, SortOrder,
};
use faultline_core::repository::{EventRepository, GroupRepository};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::state::AppState;

/// An event stream exposed over HTTP.
pub trait Stream: EventPayload {
    /// Body accepted on the ingest endpoint.
    type IngestRequest: DeserializeOwned + Send + 'static;
    /// Body accepted on `PUT /{id}`.
    type UpdateRequest: DeserializeOwned + Send + 'static;

    /// The stream's event repository.
    fn events(state: &AppState) -> Arc<dyn EventRepository<Self>>;

    /// The stream's group repository.
    fn groups(state: &AppState) -> Arc<dyn GroupRepository<Self>>;

    /// Splits an ingest body into the client time and the payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a field cannot be interpreted.
    fn ingest(request: Self::IngestRequest) -> Result<(i64, Self), DomainError>;

    /// Converts an update body into a patch.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a field cannot be interpreted.
    fn patch(request: Self::UpdateRequest) -> Result<Self::Patch, DomainError>;

    /// Builds the column filters for the `level` query parameter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the stream has no such column or
    /// the value is unknown.
    fn level_filter(level: Option<&str>) -> Result<Vec<AttributeFilter>, DomainError>;
}

/// Query string accepted by the event and group listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Exact project match.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub project_id: Option<Uuid>,
    /// Exact group (fingerprint) match; events only.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub group_id: Option<String>,
    /// Inclusive lower time bound, epoch milliseconds.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub time_from: Option<i64>,
    /// Inclusive upper time bound, epoch milliseconds.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub time_to: Option<i64>,
    /// Case-insensitive message substring.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// Log level; logs only.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub level: Option<String>,
    /// Triage status; groups only.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    /// `asc` or `desc`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sort: Option<String>,
    /// Page size.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<i64>,
    /// Rows to skip.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<i64>,
}

impl ListParams {
    fn page(&self) -> Result<Page, DomainError> {
        let sort = self
            .sort
            .as_deref()
            .map(SortOrder::from_str)
            .transpose()?
            .unwrap_or_default();
        Ok(Page::new(self.limit, self.offset, sort))
    }

    /// Builds an event listing query.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown sort order or level,
    /// or a `status` filter.
    pub fn event_query<P: Stream>(self) -> Result<EventQuery, DomainError> {
        if self.status.is_some() {
            return Err(DomainError::Validation(
                "status filter applies to groups only".into(),
            ));
        }
        let page = self.page()?;
        Ok(EventQuery {
            filter: EventFilter {
                project_id: self.project_id,
                fingerprint: self.group_id,
                time_from: self.time_from,
                time_to: self.time_to,
                search: self.search,
                attributes: P::level_filter(self.level.as_deref())?,
            },
            page,
        })
    }

    /// Builds a group listing query. Time bounds apply to `last_seen_at`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown sort order, level or
    /// status.
    pub fn group_query<P: Stream>(self) -> Result<GroupQuery, DomainError> {
        let page = self.page()?;
        let status = self
            .status
            .as_deref()
            .map(GroupStatus::from_str)
            .transpose()?;
        Ok(GroupQuery {
            filter: GroupFilter {
                project_id: self.project_id,
                time_from: self.time_from,
                time_to: self.time_to,
                search: self.search,
                status,
                attributes: P::level_filter(self.level.as_deref())?,
            },
            page,
        })
    }
}

/// Treats a missing or blank query value as absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}
