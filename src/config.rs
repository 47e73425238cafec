//! Configuration constants for the auction engine.
//!
//! This module centralizes magic numbers and configuration values
//! to improve maintainability and enable easier tuning.

/// Seconds in one day, for category durations expressed in days.
pub const SECS_PER_DAY: u64 = 86_400;

/// Anti-sniping window in seconds. A bid landing closer than this to the
/// close time pushes the close time out by exactly this much.
pub const ANTI_SNIPE_WINDOW_SECS: u64 = 300;

/// Interval in seconds between rotation ticks (expire + promote).
pub const ROTATION_INTERVAL_SECS: u64 = 60;

/// Upper bound on a single rotation tick. A tick that overruns is aborted
/// and retried on the next interval so a slow promotion scan cannot delay
/// expiry indefinitely.
pub const ROTATION_TICK_TIMEOUT_SECS: u64 = 30;

/// Duration in days for global-scope listings, and the fallback for
/// categories that do not configure their own duration.
pub const GLOBAL_LISTING_DURATION_DAYS: u32 = 30;

/// Maximum number of bid rows returned per listing history query.
pub const BID_HISTORY_LIMIT: usize = 50;

/// Environment variable overriding the rotation interval (seconds).
pub const ROTATION_INTERVAL_ENV: &str = "PLAZA_ROTATION_INTERVAL_SECS";

/// Return the current Unix timestamp in seconds.
///
/// This is a convenience wrapper that avoids the boilerplate of
/// `SystemTimeProvider::new().now_unix()` in production code paths.
/// For testable code, prefer accepting a `TimeProvider` parameter instead.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
