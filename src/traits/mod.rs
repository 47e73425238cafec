//! Trait abstractions for dependency injection and testability.
//!
//! The engine's external collaborators — the relational store, the
//! notification sink, and the clock — sit behind these traits so the
//! core protocol can be exercised without a database or push gateway.

pub mod broadcast;
pub mod store;
pub mod time;

// Re-export all traits for crate-internal use.
// The public API surface is controlled by lib.rs re-exports.
pub use broadcast::{BroadcastSink, MarketEvent, Notification, NotificationKind};
pub use store::{ListingFilter, ListingSort, MarketStore, SortDirection};
pub use time::TimeProvider;

// Re-export default implementations
pub use broadcast::TracingSink;
pub use time::SystemTimeProvider;
