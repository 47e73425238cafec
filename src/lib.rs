pub mod auction;
pub mod config;
pub mod error;
pub mod marketplace;
pub mod memory;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use auction::{AuctionEngine, CreateListingInput, RotationReport, RotationWorker};
pub use error::{MarketError, MarketResult};
pub use marketplace::{
    Bid, BidId, Category, CategoryId, Listing, ListingId, ListingScope, ListingStatus, Region,
    RegionId, User, UserId,
};
pub use memory::MemoryStore;
pub use traits::{
    BroadcastSink, ListingFilter, ListingSort, MarketEvent, MarketStore, Notification,
    NotificationKind, SortDirection, SystemTimeProvider, TimeProvider, TracingSink,
};
