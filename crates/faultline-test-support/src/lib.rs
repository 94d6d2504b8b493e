//! Shared test doubles for the Faultline crates.

mod clock;
mod repository;

pub use clock::FixedClock;
pub use repository::{FailingRepository, InMemoryRepository};
