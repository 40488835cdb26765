//! The two reconciliation processes: a confirmation watcher promoting
//! paid bookings and an expiry sweeper purging stale ones. Each runs on
//! its own timer with its own cancellation handle and talks to the
//! engine only through the store.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vesta_chain::{ChainScanner, PaymentQuery};
use vesta_core::repository::BookingStore;

/// One watcher pass: ask the chain about every pending booking and
/// conditionally approve the ones whose payment has confirmed.
/// Individual record failures are logged and skipped, never fatal.
/// Returns (approved, failed).
pub async fn confirmation_pass(
    store: &dyn BookingStore,
    scanner: &dyn ChainScanner,
) -> (usize, usize) {
    let pending = match store.list_pending().await {
        Ok(pending) => pending,
        Err(e) => {
            error!("confirmation pass could not list pending bookings: {}", e);
            return (0, 1);
        }
    };

    let mut approved = 0;
    let mut failed = 0;
    for booking in pending {
        let query = PaymentQuery {
            booking_hash: booking.booking_hash,
            payer: booking.guest_eth_address,
            amount_wei: booking.payment.amount_wei,
        };

        match scanner.find_payment(&query).await {
            Ok(Some(confirmation)) => {
                // The conditional update makes re-observation a no-op.
                match store
                    .approve(&booking.booking_hash, &confirmation.transaction_hash)
                    .await
                {
                    Ok(true) => {
                        info!(
                            booking_hash = %booking.booking_hash,
                            tx = %confirmation.transaction_hash,
                            block = confirmation.block_number,
                            "booking approved"
                        );
                        approved += 1;
                    }
                    Ok(false) => {
                        // Already transitioned by a concurrent run.
                    }
                    Err(e) => {
                        warn!(booking_hash = %booking.booking_hash, "approve failed: {}", e);
                        failed += 1;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                // Timed-out or failed scans retry on the next tick.
                warn!(booking_hash = %booking.booking_hash, "chain scan failed: {}", e);
                failed += 1;
            }
        }
    }

    (approved, failed)
}

/// One sweeper pass: purge pending bookings whose signature timestamp
/// has elapsed, freeing their guest address. Returns how many went away.
pub async fn expiry_pass(store: &dyn BookingStore) -> u64 {
    match store.remove_expired(chrono::Utc::now()).await {
        Ok(0) => 0,
        Ok(removed) => {
            info!(removed, "expired bookings purged");
            removed
        }
        Err(e) => {
            error!("expiry sweep failed: {}", e);
            0
        }
    }
}

pub fn spawn_confirmation_watcher(
    store: Arc<dyn BookingStore>,
    scanner: Arc<dyn ChainScanner>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        info!("confirmation watcher started");
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("confirmation watcher stopped");
                    break;
                }
                _ = ticker.tick() => {
                    confirmation_pass(store.as_ref(), scanner.as_ref()).await;
                }
            }
        }
    })
}

pub fn spawn_expiry_sweeper(
    store: Arc<dyn BookingStore>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        info!("expiry sweeper started");
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("expiry sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    expiry_pass(store.as_ref()).await;
                }
            }
        }
    })
}
