//! Shared application state.

use std::sync::Arc;

use faultline_core::clock::{Clock, SystemClock};
use faultline_core::repository::{EventRepository, GroupRepository};
use faultline_errors::ErrorPayload;
use faultline_logs::LogPayload;
use faultline_store::{PgEventRepository, PgGroupRepository};
use sqlx::PgPool;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic timestamps.
    pub clock: Arc<dyn Clock>,
    /// Error event repository.
    pub errors: Arc<dyn EventRepository<ErrorPayload>>,
    /// Error group repository.
    pub error_groups: Arc<dyn GroupRepository<ErrorPayload>>,
    /// Log event repository.
    pub logs: Arc<dyn EventRepository<LogPayload>>,
    /// Log group repository.
    pub log_groups: Arc<dyn GroupRepository<LogPayload>>,
}

impl AppState {
    /// Create new application state from explicit collaborators.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        errors: Arc<dyn EventRepository<ErrorPayload>>,
        error_groups: Arc<dyn GroupRepository<ErrorPayload>>,
        logs: Arc<dyn EventRepository<LogPayload>>,
        log_groups: Arc<dyn GroupRepository<LogPayload>>,
    ) -> Self {
        Self {
            clock,
            errors,
            error_groups,
            logs,
            log_groups,
        }
    }

    /// Create application state backed by `PostgreSQL` and the system clock.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self::new(
            Arc::new(SystemClock),
            Arc::new(PgEventRepository::<ErrorPayload>::new(pool.clone())),
            Arc::new(PgGroupRepository::<ErrorPayload>::new(pool.clone())),
            Arc::new(PgEventRepository::<LogPayload>::new(pool.clone())),
            Arc::new(PgGroupRepository::<LogPayload>::new(pool.clone())),
        )
    }
}
