//! Faultline — generic application layer for event ingestion.
//!
//! Every handler is generic over [`faultline_core::event::EventPayload`], so
//! the error and log streams share one ingestion pipeline: fingerprint the
//! payload, then upsert the group and insert the event in one transaction.

pub mod application;
pub mod domain;
