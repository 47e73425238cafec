pub mod bid;
pub mod catalog;
pub mod ids;
pub mod listing;

pub use bid::Bid;
pub use catalog::{Category, Region, User};
pub use ids::{BidId, CategoryId, ListingId, RegionId, UserId};
pub use listing::{Listing, ListingScope, ListingStatus};
