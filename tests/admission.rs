//! Admission scenario tests: capacity ceilings, scopes, side effects.

mod common;

use common::Harness;
use plaza::mocks::{FailingStore, MockTime, RecordingSink, StoreFailure};
use plaza::{
    AuctionEngine, CategoryId, ListingScope, ListingStatus, MarketError, MarketEvent, MemoryStore,
};

#[tokio::test]
async fn ceiling_is_never_exceeded_under_concurrent_creates() {
    let harness = Harness::with_ceiling(3).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = harness.engine.clone();
        let input = harness.region_input(&format!("Listing {i}"));
        handles.push(tokio::spawn(async move { engine.create_listing(input).await }));
    }

    let mut active = 0;
    let mut waiting = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap().status {
            ListingStatus::Active => active += 1,
            ListingStatus::Waiting => waiting += 1,
            other => panic!("unexpected status {other:?}"),
        }
    }

    assert_eq!(active, 3);
    assert_eq!(waiting, 5);

    let stored = harness
        .engine
        .active_listings(&Default::default())
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn partitions_fill_independently() {
    let harness = Harness::with_ceiling(1).await;

    // Fill (region, category).
    harness.create_active("Holder").await;
    let queued = harness
        .engine
        .create_listing(harness.region_input("Queued"))
        .await
        .unwrap();
    assert_eq!(queued.status, ListingStatus::Waiting);

    // Same region, different category: its own ceiling.
    let mut other_category = harness.region_input("Other category");
    other_category.category = harness.other_category.id;
    let listing = harness.engine.create_listing(other_category).await.unwrap();
    assert_eq!(listing.status, ListingStatus::Active);

    // Different region, same category: also unaffected.
    let mut other_region = harness.region_input("Other region");
    other_region.owner = harness.outsider.id;
    other_region.region = Some(harness.other_region.id);
    let listing = harness.engine.create_listing(other_region).await.unwrap();
    assert_eq!(listing.status, ListingStatus::Active);
}

#[tokio::test]
async fn global_scope_always_admits() {
    let harness = Harness::with_ceiling(1).await;

    // The region partition is irrelevant to global listings; create many.
    for i in 0..4 {
        let listing = harness
            .engine
            .create_listing(harness.global_input(&format!("Global {i}")))
            .await
            .unwrap();
        assert_eq!(listing.status, ListingStatus::Active);
    }
}

#[tokio::test]
async fn creation_broadcasts_for_admitted_and_queued() {
    let harness = Harness::with_ceiling(1).await;
    harness.create_active("Admitted").await;
    let queued = harness
        .engine
        .create_listing(harness.region_input("Queued"))
        .await
        .unwrap();
    assert_eq!(queued.status, ListingStatus::Waiting);

    let events = harness.sink.events().await;
    let created: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, MarketEvent::ListingCreated { .. }))
        .collect();
    assert_eq!(created.len(), 2);
}

#[tokio::test]
async fn sink_failure_does_not_fail_creation() {
    let harness = Harness::new().await;
    harness.sink.set_fail_deliveries(true).await;

    let listing = harness
        .engine
        .create_listing(harness.region_input("Quiet"))
        .await
        .unwrap();
    assert_eq!(listing.status, ListingStatus::Active);
    assert!(harness.sink.events().await.is_empty());
}

#[tokio::test]
async fn store_failure_maps_to_retryable_error() {
    let store = FailingStore::new(MemoryStore::new());
    let engine = AuctionEngine::new(store.clone(), RecordingSink::new(), MockTime::new(1_000));

    store.set_fail_mode(Some(StoreFailure::All)).await;
    let err = engine
        .create_listing(plaza::CreateListingInput {
            owner: plaza::UserId(1),
            region: None,
            category: CategoryId(1),
            scope: ListingScope::Global,
            title: "Unreachable".to_string(),
            description: String::new(),
            start_price: 1_000,
            images: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::Store(_)));
    assert!(err.is_retryable());
}
