//! Push-sink abstraction for side-effect events.
//!
//! Delivery is somebody else's problem (websocket hub, push gateway);
//! this engine only promises to hand events over after the owning
//! transaction commits, and to never let a delivery failure surface as
//! the operation's result.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::marketplace::{Listing, ListingId, UserId};

/// An event broadcast to all connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketEvent {
    ListingCreated {
        listing: Listing,
    },
    BidPlaced {
        listing: ListingId,
        current_price: u64,
        bid_count: u32,
        close_time: Option<u64>,
        bidder: UserId,
    },
    ListingPromoted {
        listing: Listing,
    },
}

/// Kind of a per-user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewBid,
    Outbid,
    Promoted,
}

/// A notification addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub listing: Option<ListingId>,
}

impl Notification {
    pub fn new_bid(listing: ListingId) -> Self {
        Self {
            kind: NotificationKind::NewBid,
            title: "New Bid!".to_string(),
            body: "Someone placed a bid on your item.".to_string(),
            listing: Some(listing),
        }
    }

    pub fn outbid(listing: ListingId) -> Self {
        Self {
            kind: NotificationKind::Outbid,
            title: "Outbid!".to_string(),
            body: "You have been outbid on an item.".to_string(),
            listing: Some(listing),
        }
    }

    pub fn promoted(listing: ListingId) -> Self {
        Self {
            kind: NotificationKind::Promoted,
            title: "Your listing is live!".to_string(),
            body: "A slot opened up and your listing is now active.".to_string(),
            listing: Some(listing),
        }
    }
}

/// Abstraction over the notification/broadcast sink.
///
/// Best-effort by contract: callers log failures and move on.
#[async_trait]
pub trait BroadcastSink: Send + Sync + Clone {
    /// Deliver an event to all interested clients.
    async fn broadcast(&self, event: &MarketEvent) -> Result<()>;

    /// Deliver a notification to one user.
    async fn notify(&self, user: UserId, notification: &Notification) -> Result<()>;
}

/// Default sink that records deliveries in the log stream.
///
/// Stands in wherever no real push infrastructure is wired up (the
/// headless binary, local development).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BroadcastSink for TracingSink {
    async fn broadcast(&self, event: &MarketEvent) -> Result<()> {
        info!(?event, "broadcast event");
        Ok(())
    }

    async fn notify(&self, user: UserId, notification: &Notification) -> Result<()> {
        info!(%user, kind = ?notification.kind, "user notification");
        Ok(())
    }
}
