//! Domain types for the log stream.

pub mod event;
pub mod group;
pub mod level;
pub mod view;
