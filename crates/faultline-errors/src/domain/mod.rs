//! Domain types for the error stream.

pub mod event;
pub mod group;
pub mod view;
