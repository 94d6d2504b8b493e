//! Faultline Core — shared domain abstractions.
//!
//! This crate defines the traits and types that the error and log bounded
//! contexts, the ingestion application layer and the storage adapters all
//! depend on. It contains no infrastructure code.

pub mod clock;
pub mod columns;
pub mod command;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod query;
pub mod repository;
pub mod side_channel;
