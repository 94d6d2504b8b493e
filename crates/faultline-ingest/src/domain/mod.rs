//! Commands accepted by the ingestion layer.

pub mod commands;
