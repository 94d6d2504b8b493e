//! `PostgreSQL` implementations of the Faultline repository traits.
//!
//! One generic adapter per trait serves both event streams; table names and
//! payload columns come from the payload's [`faultline_core::event::EventKind`]
//! and [`faultline_core::columns::Columns`] declarations.

pub mod pg_event_repository;
pub mod pg_group_repository;
mod row;

pub use pg_event_repository::PgEventRepository;
pub use pg_group_repository::PgGroupRepository;
