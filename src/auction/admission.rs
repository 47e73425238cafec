//! Listing creation and the slot-admission decision.

use tracing::info;

use crate::config::{GLOBAL_LISTING_DURATION_DAYS, SECS_PER_DAY};
use crate::error::{MarketError, MarketResult};
use crate::marketplace::{
    Category, CategoryId, Listing, ListingId, ListingScope, ListingStatus, RegionId, UserId,
};
use crate::traits::{BroadcastSink, MarketEvent, MarketStore, TimeProvider};

use super::{store_err, AuctionEngine};

/// Input to [`AuctionEngine::create_listing`].
#[derive(Debug, Clone)]
pub struct CreateListingInput {
    pub owner: UserId,
    /// Required for region scope; optional origin marker for global scope.
    pub region: Option<RegionId>,
    pub category: CategoryId,
    pub scope: ListingScope,
    pub title: String,
    pub description: String,
    /// Starting price in minor currency units.
    pub start_price: u64,
    pub images: Vec<String>,
}

impl<S, B, C> AuctionEngine<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    /// Create a listing, admitting it into a slot immediately or queuing it.
    ///
    /// Region-scope listings compete for their (region, category) slots and
    /// may only be created in the owner's home region. Global-scope listings
    /// bypass capacity entirely and run for the fixed global duration.
    pub async fn create_listing(&self, input: CreateListingInput) -> MarketResult<Listing> {
        if input.title.trim().is_empty() {
            return Err(MarketError::Validation("title must not be empty".into()));
        }
        if input.start_price == 0 {
            return Err(MarketError::Validation(
                "start price must be positive".into(),
            ));
        }

        let owner = self
            .store()
            .get_user(input.owner)
            .await
            .map_err(store_err)?
            .ok_or_else(|| MarketError::NotFound(format!("user {}", input.owner)))?;

        let category = self
            .store()
            .get_category(input.category)
            .await
            .map_err(store_err)?
            .ok_or_else(|| MarketError::NotFound(format!("category {}", input.category)))?;

        let listing = match input.scope {
            ListingScope::Global => self.admit_global(input).await?,
            ListingScope::Region => {
                let region_id = input.region.ok_or_else(|| {
                    MarketError::Validation("region is required for region scope".into())
                })?;
                self.store()
                    .get_region(region_id)
                    .await
                    .map_err(store_err)?
                    .ok_or_else(|| MarketError::NotFound(format!("region {region_id}")))?;

                if owner.home_region != Some(region_id) {
                    return Err(MarketError::Policy(
                        "listings may only be created in your home region".into(),
                    ));
                }

                self.admit_regional(input, region_id, &category).await?
            }
        };

        info!(
            listing = %listing.id,
            status = ?listing.status,
            scope = ?listing.scope,
            "created listing"
        );

        self.dispatch_event(MarketEvent::ListingCreated {
            listing: listing.clone(),
        })
        .await;

        Ok(listing)
    }

    /// Global scope: always active, fixed duration, no capacity check.
    async fn admit_global(&self, input: CreateListingInput) -> MarketResult<Listing> {
        let now = self.time().now_unix();
        let close = now + u64::from(GLOBAL_LISTING_DURATION_DAYS) * SECS_PER_DAY;
        let listing = build_listing(input, ListingStatus::Active, Some(now), Some(close), now);
        self.store().insert_listing(listing).await.map_err(store_err)
    }

    /// Region scope: count-then-insert under the partition lock, so two
    /// concurrent creations cannot both observe free capacity and overshoot
    /// the ceiling.
    async fn admit_regional(
        &self,
        input: CreateListingInput,
        region: RegionId,
        category: &Category,
    ) -> MarketResult<Listing> {
        let guard = self.partition_locks().acquire((region, category.id)).await;

        let active = self
            .store()
            .count_active_in_partition(region, category.id)
            .await
            .map_err(store_err)?;

        let now = self.time().now_unix();
        let listing = if active < category.max_active_per_region {
            let close = now + category.effective_duration_secs();
            build_listing(input, ListingStatus::Active, Some(now), Some(close), now)
        } else {
            build_listing(input, ListingStatus::Waiting, None, None, now)
        };

        let stored = self.store().insert_listing(listing).await.map_err(store_err);
        drop(guard);
        stored
    }
}

fn build_listing(
    input: CreateListingInput,
    status: ListingStatus,
    start_time: Option<u64>,
    close_time: Option<u64>,
    created_at: u64,
) -> Listing {
    Listing {
        // Assigned by the store on insert.
        id: ListingId(0),
        owner: input.owner,
        region: input.region,
        category: input.category,
        scope: input.scope,
        status,
        title: input.title,
        description: input.description,
        images: input.images,
        start_price: input.start_price,
        current_price: input.start_price,
        bid_count: 0,
        start_time,
        close_time,
        created_at,
        version: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SECS_PER_DAY;
    use crate::memory::MemoryStore;
    use crate::mocks::{MockTime, RecordingSink};

    async fn seeded_engine() -> AuctionEngine<MemoryStore, RecordingSink, MockTime> {
        let store = MemoryStore::new();
        let region = store.add_region("Riverton", "riverton").await;
        let other = store.add_region("Lakeside", "lakeside").await;
        store.add_category("Electronics", "electronics", Some(5), 2).await;
        store.add_user("ada", Some(region.id)).await;
        store.add_user("grace", Some(other.id)).await;

        AuctionEngine::new(store, RecordingSink::new(), MockTime::new(1_000))
    }

    fn input(owner: u64, region: Option<u64>, scope: ListingScope) -> CreateListingInput {
        CreateListingInput {
            owner: UserId(owner),
            region: region.map(RegionId),
            category: CategoryId(1),
            scope,
            title: "Fairly used laptop".to_string(),
            description: "Works fine".to_string(),
            start_price: 25_000,
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let engine = seeded_engine().await;
        let mut bad = input(1, Some(1), ListingScope::Region);
        bad.title = "   ".to_string();

        let err = engine.create_listing(bad).await.unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_owner_rejected() {
        let engine = seeded_engine().await;
        let err = engine
            .create_listing(input(99, Some(1), ListingScope::Region))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_region_scope_requires_region() {
        let engine = seeded_engine().await;
        let err = engine
            .create_listing(input(1, None, ListingScope::Region))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_home_region_rule() {
        let engine = seeded_engine().await;
        // grace's home region is 2, not 1
        let err = engine
            .create_listing(input(2, Some(1), ListingScope::Region))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Policy(_)));
    }

    #[tokio::test]
    async fn test_admitted_below_ceiling() {
        let engine = seeded_engine().await;
        let listing = engine
            .create_listing(input(1, Some(1), ListingScope::Region))
            .await
            .unwrap();

        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.start_time, Some(1_000));
        assert_eq!(listing.close_time, Some(1_000 + 5 * SECS_PER_DAY));
        assert_eq!(listing.current_price, listing.start_price);
    }

    #[tokio::test]
    async fn test_queued_at_ceiling() {
        let engine = seeded_engine().await;
        for _ in 0..2 {
            engine
                .create_listing(input(1, Some(1), ListingScope::Region))
                .await
                .unwrap();
        }

        let third = engine
            .create_listing(input(1, Some(1), ListingScope::Region))
            .await
            .unwrap();
        assert_eq!(third.status, ListingStatus::Waiting);
        assert_eq!(third.start_time, None);
        assert_eq!(third.close_time, None);
    }

    #[tokio::test]
    async fn test_global_scope_bypasses_capacity() {
        let engine = seeded_engine().await;
        for _ in 0..5 {
            let listing = engine
                .create_listing(input(1, None, ListingScope::Global))
                .await
                .unwrap();
            assert_eq!(listing.status, ListingStatus::Active);
            assert_eq!(
                listing.close_time,
                Some(1_000 + u64::from(GLOBAL_LISTING_DURATION_DAYS) * SECS_PER_DAY)
            );
        }
    }
}
