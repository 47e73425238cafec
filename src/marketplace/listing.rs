use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ListingId, RegionId, UserId};

/// Lifecycle status of a listing.
///
/// `Waiting` and `Active` are owned by this engine; the transition to
/// `Completed` happens downstream (settlement) and is never written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Queued for a slot in its (region, category) partition.
    Waiting,
    /// Visible and accepting bids.
    Active,
    /// Close time passed; no longer accepting bids.
    Ended,
    /// Settled downstream of this engine.
    Completed,
}

/// Whether a listing competes for regional capacity or is globally visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingScope {
    /// Competes for its (region, category) slots.
    Region,
    /// Unconstrained capacity, fixed global duration.
    Global,
}

/// An auction listing.
///
/// All prices are in minor currency units (cents); all timestamps are Unix
/// seconds. The (region, category) pair is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,

    /// The user who created the listing.
    pub owner: UserId,

    /// Region the listing belongs to. `None` only for global scope.
    pub region: Option<RegionId>,

    pub category: CategoryId,

    pub scope: ListingScope,

    pub status: ListingStatus,

    pub title: String,

    pub description: String,

    /// Media references, opaque to this engine.
    pub images: Vec<String>,

    /// Price the auction opened at.
    pub start_price: u64,

    /// Amount of the most recently accepted bid, or `start_price` if none.
    /// Never decreases while the listing is active.
    pub current_price: u64,

    pub bid_count: u32,

    /// Set when the listing is admitted or promoted; `None` while waiting.
    pub start_time: Option<u64>,

    /// Set if and only if the listing has been activated. Bids near this
    /// deadline push it out (anti-sniping).
    pub close_time: Option<u64>,

    pub created_at: u64,

    /// Optimistic-concurrency column, bumped by every successful update.
    pub version: u64,
}

impl Listing {
    /// Check if the listing is open for bids at a specific timestamp.
    pub fn is_active_at(&self, now: u64) -> bool {
        self.status == ListingStatus::Active && self.close_time.is_some_and(|end| end > now)
    }

    /// Check if an active listing's close time has passed and the rotation
    /// pass should expire it.
    pub fn is_due_at(&self, now: u64) -> bool {
        self.status == ListingStatus::Active && self.close_time.is_some_and(|end| end <= now)
    }

    /// Seconds until close (0 if closed, waiting, or already past).
    pub fn time_remaining_at(&self, now: u64) -> u64 {
        match self.close_time {
            Some(end) if self.status == ListingStatus::Active => end.saturating_sub(now),
            _ => 0,
        }
    }

    /// The capacity partition this listing competes in.
    ///
    /// Global-scope listings have no partition.
    pub fn partition(&self) -> Option<(RegionId, CategoryId)> {
        match self.scope {
            ListingScope::Region => self.region.map(|r| (r, self.category)),
            ListingScope::Global => None,
        }
    }
}
