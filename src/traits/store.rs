//! Storage abstraction over the transactional relational store.
//!
//! The engine never talks to a database directly; it composes these
//! primitives, each of which the backing store must apply atomically.
//! Compound sequences (count-then-insert, load-mutate-append) are
//! serialized by the engine's keyed locks, backed by the optimistic
//! version check on [`MarketStore::update_listing`] to catch anything
//! a lock did not cover.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::marketplace::{
    Bid, Category, CategoryId, Listing, ListingId, Region, RegionId, User, UserId,
};

/// Sort key for active-listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    CreatedAt,
    CurrentPrice,
    CloseTime,
}

/// Sort direction for active-listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Filters for the active-listing query. All fields optional; the default
/// returns every active listing, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilter {
    /// Case-insensitive substring match on the title.
    pub text: Option<String>,
    pub category: Option<CategoryId>,
    pub region: Option<RegionId>,
    /// Inclusive bounds on `current_price`, in minor units.
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub sort: ListingSort,
    pub direction: SortDirection,
}

/// Abstraction over the marketplace's relational store.
///
/// Each method is an atomic unit; none holds locks across calls. Absent
/// rows come back as `None`, not as errors — only infrastructure failures
/// (connectivity, contention) surface as `Err`, and those are safe to
/// retry wholesale.
#[async_trait]
pub trait MarketStore: Send + Sync + Clone {
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>>;

    async fn categories(&self) -> Result<Vec<Category>>;

    async fn regions(&self) -> Result<Vec<Region>>;

    /// Persist a new listing, assigning its id. Returns the stored row.
    async fn insert_listing(&self, listing: Listing) -> Result<Listing>;

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>>;

    /// Persist a modified listing if and only if the stored row still
    /// carries `listing.version`; the stored version becomes
    /// `listing.version + 1`. Returns `false` on a version mismatch
    /// (a concurrent writer got there first) without modifying anything.
    async fn update_listing(&self, listing: &Listing) -> Result<bool>;

    /// Append a bid row, assigning its id. Returns the stored row.
    async fn insert_bid(&self, bid: Bid) -> Result<Bid>;

    /// Count currently-active listings in one (region, category) partition.
    ///
    /// Derived on demand; never maintained as a counter.
    async fn count_active_in_partition(
        &self,
        region: RegionId,
        category: CategoryId,
    ) -> Result<u32>;

    /// Transition every active listing with `close_time <= now` to ended,
    /// as one conditional update. Returns the number of rows affected.
    async fn expire_due_listings(&self, now: u64) -> Result<u64>;

    /// All waiting listings, oldest creation first (the promotion order).
    async fn waiting_listings_oldest_first(&self) -> Result<Vec<Listing>>;

    /// Active listings matching the filter, in the filter's order.
    async fn active_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>>;

    /// Bid history for a listing, newest first, capped at `limit`.
    async fn bids_for_listing(&self, listing: ListingId, limit: usize) -> Result<Vec<Bid>>;

    /// The highest-amount bid on a listing from any bidder other than
    /// `exclude` (the outbid-notification target).
    async fn highest_competing_bid(
        &self,
        listing: ListingId,
        exclude: UserId,
    ) -> Result<Option<Bid>>;

    /// Listings created by one user, newest first.
    async fn listings_for_owner(&self, owner: UserId) -> Result<Vec<Listing>>;

    /// Bids placed by one user, newest first.
    async fn bids_for_user(&self, bidder: UserId) -> Result<Vec<Bid>>;
}
