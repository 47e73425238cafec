//! In-memory reference implementation of [`MarketStore`].
//!
//! Backs the headless binary and the test suites. Every trait method is
//! atomic under the inner locks, matching the store contract; the version
//! check in [`MarketStore::update_listing`] behaves like a conditional
//! `UPDATE ... WHERE version = ?`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::marketplace::{
    Bid, BidId, Category, CategoryId, Listing, ListingId, ListingStatus, Region, RegionId, User,
    UserId,
};
use crate::traits::store::{ListingFilter, ListingSort, MarketStore, SortDirection};

#[derive(Debug)]
struct MemoryStoreInner {
    users: RwLock<HashMap<UserId, User>>,
    regions: RwLock<HashMap<RegionId, Region>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
    listings: RwLock<HashMap<ListingId, Listing>>,
    bids: RwLock<Vec<Bid>>,
    next_user_id: AtomicU64,
    next_region_id: AtomicU64,
    next_category_id: AtomicU64,
    next_listing_id: AtomicU64,
    next_bid_id: AtomicU64,
}

/// In-memory marketplace store.
///
/// Cloning yields another handle onto the same storage.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                users: RwLock::new(HashMap::new()),
                regions: RwLock::new(HashMap::new()),
                categories: RwLock::new(HashMap::new()),
                listings: RwLock::new(HashMap::new()),
                bids: RwLock::new(Vec::new()),
                next_user_id: AtomicU64::new(1),
                next_region_id: AtomicU64::new(1),
                next_category_id: AtomicU64::new(1),
                next_listing_id: AtomicU64::new(1),
                next_bid_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a user, assigning its id.
    pub async fn add_user(&self, username: &str, home_region: Option<RegionId>) -> User {
        let user = User {
            id: UserId(self.inner.next_user_id.fetch_add(1, Ordering::SeqCst)),
            username: username.to_string(),
            home_region,
        };
        self.inner.users.write().await.insert(user.id, user.clone());
        user
    }

    /// Register a region, assigning its id.
    pub async fn add_region(&self, name: &str, slug: &str) -> Region {
        let region = Region {
            id: RegionId(self.inner.next_region_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            slug: slug.to_string(),
            active: true,
        };
        self.inner
            .regions
            .write()
            .await
            .insert(region.id, region.clone());
        region
    }

    /// Register a category, assigning its id.
    pub async fn add_category(
        &self,
        name: &str,
        slug: &str,
        duration_days: Option<u32>,
        max_active_per_region: u32,
    ) -> Category {
        let category = Category {
            id: CategoryId(self.inner.next_category_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            slug: slug.to_string(),
            duration_days,
            max_active_per_region,
        };
        self.inner
            .categories
            .write()
            .await
            .insert(category.id, category.clone());
        category
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filter(listing: &Listing, filter: &ListingFilter) -> bool {
    if let Some(text) = &filter.text {
        if !listing.title.to_lowercase().contains(&text.to_lowercase()) {
            return false;
        }
    }
    if let Some(category) = filter.category {
        if listing.category != category {
            return false;
        }
    }
    if let Some(region) = filter.region {
        if listing.region != Some(region) {
            return false;
        }
    }
    if let Some(min) = filter.min_price {
        if listing.current_price < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if listing.current_price > max {
            return false;
        }
    }
    true
}

fn sort_listings(listings: &mut [Listing], sort: ListingSort, direction: SortDirection) {
    listings.sort_by(|a, b| {
        let ordering = match sort {
            ListingSort::CreatedAt => a.created_at.cmp(&b.created_at),
            ListingSort::CurrentPrice => a.current_price.cmp(&b.current_price),
            ListingSort::CloseTime => a.close_time.cmp(&b.close_time),
        };
        let ordering = match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        // Deterministic tie-break.
        ordering.then(a.id.cmp(&b.id))
    });
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.users.read().await.get(&id).cloned())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.inner.categories.read().await.get(&id).cloned())
    }

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>> {
        Ok(self.inner.regions.read().await.get(&id).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let mut all: Vec<_> = self.inner.categories.read().await.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    async fn regions(&self) -> Result<Vec<Region>> {
        let mut all: Vec<_> = self.inner.regions.read().await.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    async fn insert_listing(&self, mut listing: Listing) -> Result<Listing> {
        listing.id = ListingId(self.inner.next_listing_id.fetch_add(1, Ordering::SeqCst));
        listing.version = 0;
        self.inner
            .listings
            .write()
            .await
            .insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>> {
        Ok(self.inner.listings.read().await.get(&id).cloned())
    }

    async fn update_listing(&self, listing: &Listing) -> Result<bool> {
        let mut listings = self.inner.listings.write().await;
        match listings.get_mut(&listing.id) {
            Some(stored) if stored.version == listing.version => {
                *stored = Listing {
                    version: listing.version + 1,
                    ..listing.clone()
                };
                Ok(true)
            }
            // Version mismatch or row gone: zero rows affected.
            _ => Ok(false),
        }
    }

    async fn insert_bid(&self, mut bid: Bid) -> Result<Bid> {
        bid.id = BidId(self.inner.next_bid_id.fetch_add(1, Ordering::SeqCst));
        self.inner.bids.write().await.push(bid.clone());
        Ok(bid)
    }

    async fn count_active_in_partition(
        &self,
        region: RegionId,
        category: CategoryId,
    ) -> Result<u32> {
        let listings = self.inner.listings.read().await;
        let count = listings
            .values()
            .filter(|l| {
                l.status == ListingStatus::Active
                    && l.region == Some(region)
                    && l.category == category
            })
            .count();
        Ok(count as u32)
    }

    async fn expire_due_listings(&self, now: u64) -> Result<u64> {
        let mut listings = self.inner.listings.write().await;
        let mut affected = 0;
        for listing in listings.values_mut() {
            if listing.is_due_at(now) {
                listing.status = ListingStatus::Ended;
                listing.version += 1;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn waiting_listings_oldest_first(&self) -> Result<Vec<Listing>> {
        let listings = self.inner.listings.read().await;
        let mut waiting: Vec<_> = listings
            .values()
            .filter(|l| l.status == ListingStatus::Waiting)
            .cloned()
            .collect();
        waiting.sort_by_key(|l| (l.created_at, l.id));
        Ok(waiting)
    }

    async fn active_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let listings = self.inner.listings.read().await;
        let mut active: Vec<_> = listings
            .values()
            .filter(|l| l.status == ListingStatus::Active && matches_filter(l, filter))
            .cloned()
            .collect();
        sort_listings(&mut active, filter.sort, filter.direction);
        Ok(active)
    }

    async fn bids_for_listing(&self, listing: ListingId, limit: usize) -> Result<Vec<Bid>> {
        let bids = self.inner.bids.read().await;
        let mut history: Vec<_> = bids.iter().filter(|b| b.listing == listing).cloned().collect();
        history.sort_by_key(|b| std::cmp::Reverse((b.created_at, b.id)));
        history.truncate(limit);
        Ok(history)
    }

    async fn highest_competing_bid(
        &self,
        listing: ListingId,
        exclude: UserId,
    ) -> Result<Option<Bid>> {
        let bids = self.inner.bids.read().await;
        Ok(bids
            .iter()
            .filter(|b| b.listing == listing && b.bidder != exclude)
            .max_by_key(|b| (b.amount, b.created_at, b.id))
            .cloned())
    }

    async fn listings_for_owner(&self, owner: UserId) -> Result<Vec<Listing>> {
        let listings = self.inner.listings.read().await;
        let mut own: Vec<_> = listings.values().filter(|l| l.owner == owner).cloned().collect();
        own.sort_by_key(|l| std::cmp::Reverse((l.created_at, l.id)));
        Ok(own)
    }

    async fn bids_for_user(&self, bidder: UserId) -> Result<Vec<Bid>> {
        let bids = self.inner.bids.read().await;
        let mut own: Vec<_> = bids.iter().filter(|b| b.bidder == bidder).cloned().collect();
        own.sort_by_key(|b| std::cmp::Reverse((b.created_at, b.id)));
        Ok(own)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::ListingScope;

    fn listing(created_at: u64, price: u64, title: &str) -> Listing {
        Listing {
            id: ListingId(0),
            owner: UserId(1),
            region: Some(RegionId(1)),
            category: CategoryId(1),
            scope: ListingScope::Region,
            status: ListingStatus::Active,
            title: title.to_string(),
            description: String::new(),
            images: Vec::new(),
            start_price: price,
            current_price: price,
            bid_count: 0,
            start_time: Some(created_at),
            close_time: Some(created_at + 1000),
            created_at,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert_listing(listing(1, 100, "A")).await.unwrap();
        let b = store.insert_listing(listing(2, 100, "B")).await.unwrap();
        assert_eq!(a.id, ListingId(1));
        assert_eq!(b.id, ListingId(2));
    }

    #[tokio::test]
    async fn test_update_listing_version_check() {
        let store = MemoryStore::new();
        let stored = store.insert_listing(listing(1, 100, "A")).await.unwrap();

        let mut fresh = stored.clone();
        fresh.current_price = 200;
        assert!(store.update_listing(&fresh).await.unwrap());

        // The original snapshot is now stale.
        let mut stale = stored;
        stale.current_price = 300;
        assert!(!store.update_listing(&stale).await.unwrap());

        let current = store.get_listing(fresh.id).await.unwrap().unwrap();
        assert_eq!(current.current_price, 200);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_update_missing_listing_affects_nothing() {
        let store = MemoryStore::new();
        assert!(!store.update_listing(&listing(1, 100, "ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_due_listings_is_conditional() {
        let store = MemoryStore::new();
        store.insert_listing(listing(1, 100, "due")).await.unwrap();
        let mut future = listing(1, 100, "later");
        future.close_time = Some(99_999);
        store.insert_listing(future).await.unwrap();

        assert_eq!(store.expire_due_listings(5_000).await.unwrap(), 1);
        // Second run finds nothing new.
        assert_eq!(store.expire_due_listings(5_000).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_active_listing_filters() {
        let store = MemoryStore::new();
        store.insert_listing(listing(1, 100, "Red bicycle")).await.unwrap();
        store.insert_listing(listing(2, 500, "Blue Bicycle")).await.unwrap();
        store.insert_listing(listing(3, 900, "Lawnmower")).await.unwrap();

        let found = store
            .active_listings(&ListingFilter {
                text: Some("bicycle".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let found = store
            .active_listings(&ListingFilter {
                min_price: Some(400),
                max_price: Some(600),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Blue Bicycle");
    }

    #[tokio::test]
    async fn test_active_listing_sort_directions() {
        let store = MemoryStore::new();
        store.insert_listing(listing(1, 300, "A")).await.unwrap();
        store.insert_listing(listing(2, 100, "B")).await.unwrap();
        store.insert_listing(listing(3, 200, "C")).await.unwrap();

        // Default: newest first.
        let found = store.active_listings(&ListingFilter::default()).await.unwrap();
        let titles: Vec<_> = found.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["C", "B", "A"]);

        let found = store
            .active_listings(&ListingFilter {
                sort: ListingSort::CurrentPrice,
                direction: SortDirection::Ascending,
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<_> = found.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_bid_history_newest_first_with_limit() {
        let store = MemoryStore::new();
        for i in 0..5u64 {
            store
                .insert_bid(Bid {
                    id: BidId(0),
                    listing: ListingId(1),
                    bidder: UserId(1),
                    amount: 100 + i,
                    created_at: 1000 + i,
                })
                .await
                .unwrap();
        }

        let history = store.bids_for_listing(ListingId(1), 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].amount, 104);
        assert_eq!(history[2].amount, 102);
    }

    #[tokio::test]
    async fn test_highest_competing_bid_excludes_bidder() {
        let store = MemoryStore::new();
        for (user, amount) in [(1u64, 100u64), (2, 200), (3, 150)] {
            store
                .insert_bid(Bid {
                    id: BidId(0),
                    listing: ListingId(1),
                    bidder: UserId(user),
                    amount,
                    created_at: 1000,
                })
                .await
                .unwrap();
        }

        let top = store
            .highest_competing_bid(ListingId(1), UserId(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(top.bidder, UserId(3));
        assert_eq!(top.amount, 150);

        assert!(store
            .highest_competing_bid(ListingId(2), UserId(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_partition_count_ignores_other_partitions() {
        let store = MemoryStore::new();
        store.insert_listing(listing(1, 100, "A")).await.unwrap();
        let mut other_region = listing(2, 100, "B");
        other_region.region = Some(RegionId(2));
        store.insert_listing(other_region).await.unwrap();
        let mut waiting = listing(3, 100, "C");
        waiting.status = ListingStatus::Waiting;
        waiting.start_time = None;
        waiting.close_time = None;
        store.insert_listing(waiting).await.unwrap();

        let count = store
            .count_active_in_partition(RegionId(1), CategoryId(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
