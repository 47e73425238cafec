//! Read-side operations: browse, history, catalog.

use crate::config::BID_HISTORY_LIMIT;
use crate::error::{MarketError, MarketResult};
use crate::marketplace::{Bid, Category, Listing, ListingId, Region, UserId};
use crate::traits::{BroadcastSink, ListingFilter, MarketStore, TimeProvider};

use super::{store_err, AuctionEngine};

impl<S, B, C> AuctionEngine<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    /// Fetch one listing.
    pub async fn get_listing(&self, id: ListingId) -> MarketResult<Listing> {
        self.store()
            .get_listing(id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| MarketError::NotFound(format!("listing {id}")))
    }

    /// Browse active listings. An empty result is a valid answer.
    pub async fn active_listings(&self, filter: &ListingFilter) -> MarketResult<Vec<Listing>> {
        self.store().active_listings(filter).await.map_err(store_err)
    }

    /// Bid history for a listing, newest first.
    pub async fn bids_for_listing(&self, listing: ListingId) -> MarketResult<Vec<Bid>> {
        self.store()
            .bids_for_listing(listing, BID_HISTORY_LIMIT)
            .await
            .map_err(store_err)
    }

    /// Listings created by one user, newest first.
    pub async fn listings_for_owner(&self, owner: UserId) -> MarketResult<Vec<Listing>> {
        self.store().listings_for_owner(owner).await.map_err(store_err)
    }

    /// Bids placed by one user, newest first.
    pub async fn bids_for_user(&self, bidder: UserId) -> MarketResult<Vec<Bid>> {
        self.store().bids_for_user(bidder).await.map_err(store_err)
    }

    pub async fn categories(&self) -> MarketResult<Vec<Category>> {
        self.store().categories().await.map_err(store_err)
    }

    pub async fn regions(&self) -> MarketResult<Vec<Region>> {
        self.store().regions().await.map_err(store_err)
    }
}
