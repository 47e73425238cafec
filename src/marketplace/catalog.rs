//! Catalog records: categories, regions, and the slice of the user record
//! the engine needs for admission checks.

use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, RegionId, UserId};
use crate::config::{GLOBAL_LISTING_DURATION_DAYS, SECS_PER_DAY};

/// A listing category, carrying the slot policy for its partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    pub slug: String,

    /// Days a listing stays active once admitted. `None` means the
    /// global default applies.
    pub duration_days: Option<u32>,

    /// Maximum number of simultaneously active listings sharing this
    /// category within one region.
    pub max_active_per_region: u32,
}

impl Category {
    /// Active duration for admitted region-scope listings, in seconds.
    pub fn effective_duration_secs(&self) -> u64 {
        u64::from(self.duration_days.unwrap_or(GLOBAL_LISTING_DURATION_DAYS)) * SECS_PER_DAY
    }
}

/// A geographic region. Purely a partitioning key; no behavior of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,

    pub name: String,

    pub slug: String,

    pub active: bool,
}

/// The slice of a user account visible to the engine.
///
/// Credentials and profile data live with the auth service, out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    pub username: String,

    /// Region-scope listings may only be created here.
    pub home_region: Option<RegionId>,
}
