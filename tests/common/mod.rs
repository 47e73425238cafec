//! Shared harness for the engine scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use plaza::mocks::{MockTime, RecordingSink};
use plaza::{
    AuctionEngine, Category, CreateListingInput, Listing, ListingScope, ListingStatus,
    MemoryStore, Region, User,
};

/// Engine wired to the in-memory store, a recording sink, and a mock clock,
/// with a small seeded catalog.
pub struct Harness {
    pub store: MemoryStore,
    pub time: MockTime,
    pub sink: RecordingSink,
    pub engine: Arc<AuctionEngine<MemoryStore, RecordingSink, MockTime>>,
    pub region: Region,
    pub other_region: Region,
    pub category: Category,
    pub other_category: Category,
    /// Home region: `region`.
    pub owner: User,
    /// Home region: `region`.
    pub bidder: User,
    /// Home region: `region`.
    pub rival: User,
    /// Home region: `other_region`.
    pub outsider: User,
}

impl Harness {
    /// Harness whose main category admits `ceiling` concurrent listings
    /// per region, with a 10-day slot duration. The clock starts at
    /// 100_000.
    pub async fn with_ceiling(ceiling: u32) -> Self {
        let store = MemoryStore::new();
        let region = store.add_region("Riverton", "riverton").await;
        let other_region = store.add_region("Lakeside", "lakeside").await;
        let category = store.add_category("Furniture", "furniture", Some(10), ceiling).await;
        let other_category = store.add_category("Electronics", "electronics", Some(5), ceiling).await;
        let owner = store.add_user("ada", Some(region.id)).await;
        let bidder = store.add_user("grace", Some(region.id)).await;
        let rival = store.add_user("edsger", Some(region.id)).await;
        let outsider = store.add_user("barbara", Some(other_region.id)).await;

        let time = MockTime::new(100_000);
        let sink = RecordingSink::new();
        let engine = Arc::new(AuctionEngine::new(
            store.clone(),
            sink.clone(),
            time.clone(),
        ));

        Self {
            store,
            time,
            sink,
            engine,
            region,
            other_region,
            category,
            other_category,
            owner,
            bidder,
            rival,
            outsider,
        }
    }

    pub async fn new() -> Self {
        Self::with_ceiling(5).await
    }

    /// Region-scope input in the owner's home region and the main category.
    pub fn region_input(&self, title: &str) -> CreateListingInput {
        CreateListingInput {
            owner: self.owner.id,
            region: Some(self.region.id),
            category: self.category.id,
            scope: ListingScope::Region,
            title: title.to_string(),
            description: String::new(),
            start_price: 10_000,
            images: Vec::new(),
        }
    }

    /// Global-scope input in the main category.
    pub fn global_input(&self, title: &str) -> CreateListingInput {
        CreateListingInput {
            owner: self.owner.id,
            region: None,
            category: self.category.id,
            scope: ListingScope::Global,
            title: title.to_string(),
            description: String::new(),
            start_price: 10_000,
            images: Vec::new(),
        }
    }

    /// Create a region-scope listing and assert it was admitted.
    pub async fn create_active(&self, title: &str) -> Listing {
        let listing = self
            .engine
            .create_listing(self.region_input(title))
            .await
            .unwrap();
        assert_eq!(listing.status, ListingStatus::Active, "{title} not admitted");
        listing
    }

    /// Re-read a listing through the engine.
    pub async fn listing(&self, listing: &Listing) -> Listing {
        self.engine.get_listing(listing.id).await.unwrap()
    }
}
