//! Mock implementations for testing.
//!
//! Controllable stand-ins for the engine's external collaborators,
//! enabling deterministic tests of the full listing lifecycle.

pub mod broadcast;
pub mod store;
pub mod time;

pub use broadcast::RecordingSink;
pub use store::{FailingStore, StoreFailure};
pub use time::MockTime;
