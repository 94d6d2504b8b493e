//! Faultline — Error events bounded context.
//!
//! Responsible for application errors: message, stacktrace, source location
//! and the request/environment attachments sent alongside them. Errors group
//! on their normalised message plus source file and line.

pub mod domain;

pub use domain::event::{ErrorPatch, ErrorPayload};
pub use domain::group::ErrorGroupDetails;
pub use domain::view::ErrorView;
