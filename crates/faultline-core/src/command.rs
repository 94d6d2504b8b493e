//! Command abstractions shared by the ingestion and triage handlers.

use uuid::Uuid;

/// A write request against an event stream or a group aggregate.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name used in log records, e.g. `errors.create`.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried from the inbound request into every log record.
    fn correlation_id(&self) -> Uuid;
}
