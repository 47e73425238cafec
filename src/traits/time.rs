//! Clock abstraction for testable time-driven transitions.
//!
//! Admission close times, anti-snipe extensions, and rotation expiry all
//! read the clock through this trait so tests can drive them
//! deterministically.

use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for providing the current Unix timestamp.
pub trait TimeProvider: Send + Sync {
    /// Returns the current Unix timestamp in seconds.
    fn now_unix(&self) -> u64;
}

/// Production implementation that uses the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl SystemTimeProvider {
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_plausible() {
        let now = SystemTimeProvider::new().now_unix();

        // After 2020, before 2100.
        assert!(now > 1_577_836_800);
        assert!(now < 4_102_444_800);
    }

    #[test]
    fn test_system_clock_does_not_go_backwards() {
        let provider = SystemTimeProvider::new();
        let t1 = provider.now_unix();
        let t2 = provider.now_unix();
        assert!(t2 >= t1);
    }
}
