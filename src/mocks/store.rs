//! Failure-injecting store wrapper for testing error paths.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::marketplace::{
    Bid, Category, CategoryId, Listing, ListingId, Region, RegionId, User, UserId,
};
use crate::traits::store::{ListingFilter, MarketStore};

/// Which store operations should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// Fail all operations.
    All,
    /// Fail only read operations.
    Reads,
    /// Fail only write operations.
    Writes,
}

/// Wrapper that delegates to an inner store until a failure mode is set.
///
/// Used to verify that the engine maps infrastructure failures to
/// `MarketError::Store` and that partially-failed operations leave no
/// inconsistent state behind.
#[derive(Debug, Clone)]
pub struct FailingStore<S: MarketStore> {
    inner: S,
    fail_mode: Arc<RwLock<Option<StoreFailure>>>,
}

impl<S: MarketStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_mode: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_fail_mode(&self, mode: Option<StoreFailure>) {
        *self.fail_mode.write().await = mode;
    }

    async fn gate(&self, is_write: bool) -> Result<()> {
        match *self.fail_mode.read().await {
            Some(StoreFailure::All) => bail!("simulated store failure"),
            Some(StoreFailure::Reads) if !is_write => bail!("simulated store read failure"),
            Some(StoreFailure::Writes) if is_write => bail!("simulated store write failure"),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<S: MarketStore> MarketStore for FailingStore<S> {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.gate(false).await?;
        self.inner.get_user(id).await
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.gate(false).await?;
        self.inner.get_category(id).await
    }

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>> {
        self.gate(false).await?;
        self.inner.get_region(id).await
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.gate(false).await?;
        self.inner.categories().await
    }

    async fn regions(&self) -> Result<Vec<Region>> {
        self.gate(false).await?;
        self.inner.regions().await
    }

    async fn insert_listing(&self, listing: Listing) -> Result<Listing> {
        self.gate(true).await?;
        self.inner.insert_listing(listing).await
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        self.gate(false).await?;
        self.inner.get_listing(id).await
    }

    async fn update_listing(&self, listing: &Listing) -> Result<bool> {
        self.gate(true).await?;
        self.inner.update_listing(listing).await
    }

    async fn insert_bid(&self, bid: Bid) -> Result<Bid> {
        self.gate(true).await?;
        self.inner.insert_bid(bid).await
    }

    async fn count_active_in_partition(
        &self,
        region: RegionId,
        category: CategoryId,
    ) -> Result<u32> {
        self.gate(false).await?;
        self.inner.count_active_in_partition(region, category).await
    }

    async fn expire_due_listings(&self, now: u64) -> Result<u64> {
        self.gate(true).await?;
        self.inner.expire_due_listings(now).await
    }

    async fn waiting_listings_oldest_first(&self) -> Result<Vec<Listing>> {
        self.gate(false).await?;
        self.inner.waiting_listings_oldest_first().await
    }

    async fn active_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        self.gate(false).await?;
        self.inner.active_listings(filter).await
    }

    async fn bids_for_listing(&self, listing: ListingId, limit: usize) -> Result<Vec<Bid>> {
        self.gate(false).await?;
        self.inner.bids_for_listing(listing, limit).await
    }

    async fn highest_competing_bid(
        &self,
        listing: ListingId,
        exclude: UserId,
    ) -> Result<Option<Bid>> {
        self.gate(false).await?;
        self.inner.highest_competing_bid(listing, exclude).await
    }

    async fn listings_for_owner(&self, owner: UserId) -> Result<Vec<Listing>> {
        self.gate(false).await?;
        self.inner.listings_for_owner(owner).await
    }

    async fn bids_for_user(&self, bidder: UserId) -> Result<Vec<Bid>> {
        self.gate(false).await?;
        self.inner.bids_for_user(bidder).await
    }
}
