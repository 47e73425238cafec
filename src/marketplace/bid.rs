use serde::{Deserialize, Serialize};

use super::ids::{BidId, ListingId, UserId};

/// An accepted bid against a listing.
///
/// Bid rows are append-only: they are never updated or deleted, and within
/// one listing they are totally ordered by `created_at`. The listing's
/// `current_price` always equals the amount of its newest bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,

    pub listing: ListingId,

    pub bidder: UserId,

    /// Amount in minor currency units (cents).
    pub amount: u64,

    /// Unix timestamp the bid was accepted.
    pub created_at: u64,
}
