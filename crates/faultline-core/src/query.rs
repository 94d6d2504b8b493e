//! Filter, pagination and statistics types for event and group reads.

use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::GroupStatus;

/// Page size used when the caller gives none or a non-positive one.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size honoured.
pub const MAX_LIMIT: i64 = 1000;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Trailing window for [`EventStats::last_24h`].
pub const WINDOW_24H_MS: i64 = 24 * HOUR_MS;
/// Trailing window for [`EventStats::last_7d`].
pub const WINDOW_7D_MS: i64 = 7 * 24 * HOUR_MS;
/// Trailing window for [`EventStats::last_30d`].
pub const WINDOW_30D_MS: i64 = 30 * 24 * HOUR_MS;

/// Sort direction on event time (events) or last-seen time (groups).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::Validation(format!("unknown sort order: {other}"))),
        }
    }
}

/// Limit/offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows returned.
    pub limit: i64,
    /// Number of rows skipped.
    pub offset: i64,
    /// Sort direction.
    pub sort: SortOrder,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: SortOrder::default(),
        }
    }
}

impl Page {
    /// Normalises caller-supplied values: a missing or non-positive limit
    /// becomes [`DEFAULT_LIMIT`], limits above [`MAX_LIMIT`] are capped and a
    /// negative offset becomes zero.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>, sort: SortOrder) -> Self {
        let limit = match limit {
            Some(l) if l >= 1 => l.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        Self {
            limit,
            offset,
            sort,
        }
    }
}

/// Equality filter on a payload column, e.g. `level = 'ERROR'`.
///
/// The column name must be one the payload declares; storage adapters reject
/// anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    /// Column name.
    pub column: &'static str,
    /// Expected text rendering of the value.
    pub value: String,
}

/// Filters for event reads. Time bounds are inclusive, on client event time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Exact project match.
    pub project_id: Option<Uuid>,
    /// Exact fingerprint match.
    pub fingerprint: Option<String>,
    /// Lower bound on `time`, epoch milliseconds.
    pub time_from: Option<i64>,
    /// Upper bound on `time`, epoch milliseconds.
    pub time_to: Option<i64>,
    /// Case-insensitive substring of the message.
    pub search: Option<String>,
    /// Additional payload column filters.
    pub attributes: Vec<AttributeFilter>,
}

/// Filters for group reads. Time bounds are inclusive, on `last_seen_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    /// Exact project match.
    pub project_id: Option<Uuid>,
    /// Lower bound on `last_seen_at`, epoch milliseconds.
    pub time_from: Option<i64>,
    /// Upper bound on `last_seen_at`, epoch milliseconds.
    pub time_to: Option<i64>,
    /// Case-insensitive substring of the message.
    pub search: Option<String>,
    /// Exact triage status.
    pub status: Option<GroupStatus>,
    /// Additional group-detail column filters.
    pub attributes: Vec<AttributeFilter>,
}

/// Filtered, paginated event listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Row filters.
    pub filter: EventFilter,
    /// Pagination and sort.
    pub page: Page,
}

/// Filtered, paginated group listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupQuery {
    /// Row filters.
    pub filter: GroupFilter,
    /// Pagination and sort.
    pub page: Page,
}

/// One page of results plus the total number of filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    /// Total rows matching the filter, ignoring pagination.
    pub count: i64,
    /// The requested page.
    pub items: Vec<T>,
}

/// Event counts over trailing windows ending now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    /// Events with `time >= now - 24h`.
    #[serde(rename = "last24h")]
    pub last_24h: i64,
    /// Events with `time >= now - 7d`.
    #[serde(rename = "last7d")]
    pub last_7d: i64,
    /// Events with `time >= now - 30d`.
    #[serde(rename = "last30d")]
    pub last_30d: i64,
}

/// Escapes `%`, `_` and `\` so a search term matches literally inside
/// `ILIKE '%…%'`.
#[must_use]
pub fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-insensitive substring match with the same semantics as the SQL
/// search filter.
#[must_use]
pub fn matches_search(message: &str, search: &str) -> bool {
    message.to_lowercase().contains(&search.to_lowercase())
}
