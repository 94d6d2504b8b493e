//! Route modules: ingestion, per-stream event and group routes, health.

pub mod errors;
pub mod events;
pub mod groups;
pub mod health;
pub mod ingest;
pub mod logs;
pub mod stream;
