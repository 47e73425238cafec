//! The rotation pass: expire due listings, promote waiting ones.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ROTATION_INTERVAL_SECS, ROTATION_TICK_TIMEOUT_SECS};
use crate::error::{MarketError, MarketResult};
use crate::marketplace::{Listing, ListingStatus};
use crate::traits::{BroadcastSink, MarketEvent, MarketStore, Notification, TimeProvider};

use super::{store_err, AuctionEngine};

/// What one rotation tick accomplished.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RotationReport {
    /// Active listings whose close time had passed.
    pub expired: u64,
    /// Waiting listings promoted into freed slots.
    pub promoted: u64,
}

impl<S, B, C> AuctionEngine<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    /// Run one expire-then-promote pass.
    ///
    /// Expiry is a single conditional update; each promotion is its own
    /// atomic unit under the candidate's partition lock, so a failure on
    /// one candidate is logged and skipped without aborting the tick.
    /// Both halves are idempotent — a re-run after a partial tick is safe.
    pub async fn run_rotation_tick(&self) -> MarketResult<RotationReport> {
        let now = self.time().now_unix();

        let expired = self
            .store()
            .expire_due_listings(now)
            .await
            .map_err(store_err)?;
        if expired > 0 {
            info!(expired, "expired due listings");
        }

        // Oldest first. Each candidate re-counts its partition fresh, so a
        // promotion can consume the slot the previous candidate would have
        // taken, and vice versa.
        let waiting = self
            .store()
            .waiting_listings_oldest_first()
            .await
            .map_err(store_err)?;

        let mut promoted = Vec::new();
        for candidate in waiting {
            let id = candidate.id;
            match self.try_promote(candidate, now).await {
                Ok(Some(listing)) => promoted.push(listing),
                Ok(None) => {}
                Err(err) => {
                    warn!(listing = %id, error = %err, "promotion failed, skipping candidate");
                }
            }
        }

        // Post-commit side effects, best-effort.
        for listing in &promoted {
            self.dispatch_notification(listing.owner, Notification::promoted(listing.id))
                .await;
            self.dispatch_event(MarketEvent::ListingPromoted {
                listing: listing.clone(),
            })
            .await;
        }

        let report = RotationReport {
            expired,
            promoted: promoted.len() as u64,
        };
        if report.promoted > 0 {
            info!(promoted = report.promoted, "promoted waiting listings");
        }
        Ok(report)
    }

    /// Promote one waiting listing if its partition has a free slot.
    ///
    /// Returns `Ok(None)` when the partition is still full.
    async fn try_promote(&self, mut listing: Listing, now: u64) -> MarketResult<Option<Listing>> {
        let Some((region, category_id)) = listing.partition() else {
            // Global listings are admitted directly and never queue, so a
            // waiting row without a partition cannot be promoted.
            warn!(listing = %listing.id, "waiting listing has no partition, skipping");
            return Ok(None);
        };

        let category = self
            .store()
            .get_category(category_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| MarketError::NotFound(format!("category {category_id}")))?;

        let _guard = self.partition_locks().acquire((region, category_id)).await;

        let active = self
            .store()
            .count_active_in_partition(region, category_id)
            .await
            .map_err(store_err)?;
        if active >= category.max_active_per_region {
            return Ok(None);
        }

        listing.status = ListingStatus::Active;
        listing.start_time = Some(now);
        listing.close_time = Some(now + category.effective_duration_secs());

        if !self
            .store()
            .update_listing(&listing)
            .await
            .map_err(store_err)?
        {
            // Stale read: another writer touched the row since the scan.
            // The candidate stays waiting and the next tick retries.
            return Err(MarketError::Store(format!(
                "listing {} changed underneath the promotion",
                listing.id
            )));
        }
        listing.version += 1;

        debug!(listing = %listing.id, close_time = ?listing.close_time, "promoted to active");
        Ok(Some(listing))
    }
}

/// Recurring background driver for [`AuctionEngine::run_rotation_tick`].
///
/// One tick at a time: the loop awaits each tick (bounded by the timeout
/// guard) before sleeping again, so ticks never overlap.
pub struct RotationWorker<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    engine: Arc<AuctionEngine<S, B, C>>,
    interval: Duration,
    tick_timeout: Duration,
    shutdown: CancellationToken,
}

impl<S, B, C> RotationWorker<S, B, C>
where
    S: MarketStore + 'static,
    B: BroadcastSink + 'static,
    C: TimeProvider + 'static,
{
    pub fn new(engine: Arc<AuctionEngine<S, B, C>>) -> Self {
        Self::with_interval(engine, Duration::from_secs(ROTATION_INTERVAL_SECS))
    }

    pub fn with_interval(engine: Arc<AuctionEngine<S, B, C>>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            tick_timeout: Duration::from_secs(ROTATION_TICK_TIMEOUT_SECS),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the worker when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn the worker loop.
    pub fn start(self) -> JoinHandle<()> {
        info!(interval = ?self.interval, "rotation worker started");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = self.shutdown.cancelled() => {
                        info!("rotation worker shutting down");
                        break;
                    }
                    () = tokio::time::sleep(self.interval) => {}
                }

                match tokio::time::timeout(self.tick_timeout, self.engine.run_rotation_tick()).await
                {
                    Ok(Ok(report)) => {
                        if report.expired > 0 || report.promoted > 0 {
                            info!(
                                expired = report.expired,
                                promoted = report.promoted,
                                "rotation tick"
                            );
                        } else {
                            debug!("rotation tick: nothing to do");
                        }
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, "rotation tick failed, retrying next interval");
                    }
                    Err(_) => {
                        warn!(timeout = ?self.tick_timeout, "rotation tick timed out, retrying next interval");
                    }
                }
            }
        })
    }
}
