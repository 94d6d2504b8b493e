//! Faultline — Log events bounded context.
//!
//! Responsible for structured log lines: a severity level, a message and an
//! optional JSON context. Logs group on their normalised message plus level.

pub mod domain;

pub use domain::event::{LogPatch, LogPayload};
pub use domain::group::LogGroupDetails;
pub use domain::level::Level;
pub use domain::view::LogView;
