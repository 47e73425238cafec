//! Keyed advisory locks for the engine's compound store sequences.
//!
//! The store only guarantees per-call atomicity, so the engine serializes
//! its own multi-step sequences: one lock per listing id serializes
//! bidders on the same listing, and one lock per (region, category)
//! partition serializes the count-then-act admission and promotion
//! decisions. Unrelated keys never contend.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A registry of async mutexes, allocated lazily per key.
///
/// TODO: evict entries once their listing has ended; the map currently
/// grows with the number of distinct keys ever locked.
pub struct KeyedLocks<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for `key`, waiting until any current holder of the
    /// same key releases it. The returned guard releases on drop.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
