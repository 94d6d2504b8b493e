//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Callers distinguish the not-found variants from `Infrastructure` so the
/// HTTP layer can map them to different status classes.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No error or log event exists with the given id.
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    /// No group exists with the given fingerprint.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// Malformed or missing input rejected before touching storage.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for either not-found variant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound(_) | Self::GroupNotFound(_))
    }
}
