//! The auction engine: slot admission, bid acceptance, and rotation.
//!
//! [`AuctionEngine`] contains the transactional core, abstracted over the
//! store, the notification sink, and the clock. Everything time-driven
//! reads the injected [`TimeProvider`], so the full lifecycle is testable
//! with a mock clock.

pub mod admission;
pub mod bidding;
pub mod locks;
pub mod queries;
pub mod rotation;

use tracing::warn;

use crate::error::MarketError;
use crate::marketplace::{CategoryId, ListingId, RegionId, UserId};
use crate::traits::{BroadcastSink, MarketEvent, MarketStore, Notification, TimeProvider};
use locks::KeyedLocks;

pub use admission::CreateListingInput;
pub use rotation::{RotationReport, RotationWorker};

/// Map a store-level failure into the domain taxonomy.
///
/// Store primitives commit nothing partial, so everything surfacing here
/// is safe for the caller to retry wholesale.
pub(crate) fn store_err(err: anyhow::Error) -> MarketError {
    MarketError::Store(err.to_string())
}

/// The admission-and-bidding engine.
///
/// One instance per process; the [`RotationWorker`] shares it so that
/// admission and promotion contend on the same partition locks.
pub struct AuctionEngine<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    store: S,
    sink: B,
    time: C,
    /// Serializes bidders on the same listing.
    listing_locks: KeyedLocks<ListingId>,
    /// Serializes count-then-act decisions per (region, category).
    partition_locks: KeyedLocks<(RegionId, CategoryId)>,
}

impl<S, B, C> AuctionEngine<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    pub fn new(store: S, sink: B, time: C) -> Self {
        Self {
            store,
            sink,
            time,
            listing_locks: KeyedLocks::new(),
            partition_locks: KeyedLocks::new(),
        }
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn time(&self) -> &C {
        &self.time
    }

    pub(crate) fn listing_locks(&self) -> &KeyedLocks<ListingId> {
        &self.listing_locks
    }

    pub(crate) fn partition_locks(&self) -> &KeyedLocks<(RegionId, CategoryId)> {
        &self.partition_locks
    }

    /// Broadcast an event, best-effort. A sink failure is logged and
    /// swallowed; it never changes the outcome of the operation that
    /// produced the event.
    pub(crate) async fn dispatch_event(&self, event: MarketEvent) {
        if let Err(err) = self.sink.broadcast(&event).await {
            warn!(error = %err, "event broadcast failed");
        }
    }

    /// Notify one user, best-effort.
    pub(crate) async fn dispatch_notification(&self, user: UserId, notification: Notification) {
        if let Err(err) = self.sink.notify(user, &notification).await {
            warn!(%user, error = %err, "user notification failed");
        }
    }
}
