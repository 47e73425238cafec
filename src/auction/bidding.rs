//! Bid acceptance against a live listing.

use anyhow::anyhow;
use tracing::{debug, error, info};

use crate::config::ANTI_SNIPE_WINDOW_SECS;
use crate::error::{MarketError, MarketResult};
use crate::marketplace::{Bid, BidId, Listing, ListingId, ListingStatus, UserId};
use crate::traits::{BroadcastSink, MarketEvent, MarketStore, Notification, TimeProvider};

use super::{store_err, AuctionEngine};

impl<S, B, C> AuctionEngine<S, B, C>
where
    S: MarketStore,
    B: BroadcastSink,
    C: TimeProvider,
{
    /// Accept a bid, returning the updated listing snapshot.
    ///
    /// The whole check-mutate-append sequence runs under the listing's
    /// lock, so concurrent bidders on the same listing serialize and each
    /// one sees the price of the last committed bid. Bidders on other
    /// listings are unaffected.
    pub async fn place_bid(
        &self,
        listing_id: ListingId,
        bidder: UserId,
        amount: u64,
    ) -> MarketResult<Listing> {
        let guard = self.listing_locks().acquire(listing_id).await;

        let mut listing = self
            .store()
            .get_listing(listing_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| MarketError::NotFound(format!("listing {listing_id}")))?;

        if listing.status != ListingStatus::Active {
            return Err(MarketError::StateConflict(format!(
                "listing {listing_id} is not active"
            )));
        }
        if amount <= listing.current_price {
            return Err(MarketError::StateConflict(format!(
                "bid must be higher than the current price of {}",
                listing.current_price
            )));
        }

        let now = self.time().now_unix();
        let close = listing
            .close_time
            .ok_or_else(|| anyhow!("active listing {listing_id} has no close time"))?;

        // Anti-sniping: a bid landing inside the window pushes the close
        // time out by exactly one window, measured from the old close time.
        if close.saturating_sub(now) < ANTI_SNIPE_WINDOW_SECS {
            listing.close_time = Some(close + ANTI_SNIPE_WINDOW_SECS);
            debug!(
                listing = %listing_id,
                close_time = close + ANTI_SNIPE_WINDOW_SECS,
                "anti-snipe extension"
            );
        }

        let previous_price = listing.current_price;
        listing.current_price = amount;
        listing.bid_count += 1;

        if !self
            .store()
            .update_listing(&listing)
            .await
            .map_err(store_err)?
        {
            return Err(MarketError::Store(format!(
                "listing {listing_id} was modified concurrently"
            )));
        }
        listing.version += 1;

        if let Err(err) = self
            .store()
            .insert_bid(Bid {
                // Assigned by the store on insert.
                id: BidId(0),
                listing: listing_id,
                bidder,
                amount,
                created_at: now,
            })
            .await
        {
            // The listing update already landed; put it back so the price
            // never disagrees with the bid trail. Still under the lock.
            let mut revert = listing.clone();
            revert.current_price = previous_price;
            revert.bid_count -= 1;
            revert.close_time = Some(close);
            match self.store().update_listing(&revert).await {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    error!(listing = %listing_id, "failed to revert listing after bid insert failure");
                }
            }
            return Err(store_err(err));
        }

        // Resolve the outbid target while the view is still consistent.
        let outbid = self
            .store()
            .highest_competing_bid(listing_id, bidder)
            .await
            .map_err(store_err)?;

        drop(guard);

        info!(
            listing = %listing_id,
            %bidder,
            amount,
            bid_count = listing.bid_count,
            "accepted bid"
        );

        // Post-commit side effects, best-effort.
        if listing.owner != bidder {
            self.dispatch_notification(listing.owner, Notification::new_bid(listing_id))
                .await;
        }
        if let Some(previous) = outbid {
            self.dispatch_notification(previous.bidder, Notification::outbid(listing_id))
                .await;
        }
        self.dispatch_event(MarketEvent::BidPlaced {
            listing: listing_id,
            current_price: listing.current_price,
            bid_count: listing.bid_count,
            close_time: listing.close_time,
            bidder,
        })
        .await;

        Ok(listing)
    }
}
