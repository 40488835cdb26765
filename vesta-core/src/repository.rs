use crate::booking::Booking;
use crate::hash::BookingHash;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Atomic insert hit the booking-hash uniqueness constraint.
    #[error("a booking with this hash already exists")]
    DuplicateBookingHash,
    /// Atomic insert hit the active-guest-address uniqueness constraint.
    #[error("this guest address already holds an active booking")]
    DuplicateGuestAddress,
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Durable booking store. All state-machine guards live here as native
/// conditional updates so concurrent writers cannot double-apply a
/// transition.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new pending booking. Uniqueness of `booking_hash` and of
    /// the guest address among active bookings is enforced atomically by
    /// the store, never by a prior read.
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn get(&self, hash: &BookingHash) -> Result<Option<Booking>, StoreError>;

    /// All bookings currently in `pending`, for the confirmation watcher.
    async fn list_pending(&self) -> Result<Vec<Booking>, StoreError>;

    /// `pending -> approved`, recording the confirmed payment hash.
    /// Returns false when no pending row matched (already transitioned
    /// or unknown), which makes re-observation of the same on-chain
    /// event a no-op.
    async fn approve(&self, hash: &BookingHash, transaction_ref: &str) -> Result<bool, StoreError>;

    /// Remove pending bookings whose signature timestamp has elapsed,
    /// freeing their guest address. Returns how many rows went away.
    /// Approved rows are never touched.
    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Remove a booking only if it is in `approved`. Returns whether a
    /// row matched; callers surface false uniformly with unknown hashes.
    async fn delete_approved(&self, hash: &BookingHash) -> Result<bool, StoreError>;
}

/// Monotonic booking-index source. Strictly increasing and never
/// repeating across concurrent callers; gaps are fine.
#[async_trait]
pub trait IndexAllocator: Send + Sync {
    async fn next(&self) -> Result<i64, StoreError>;

    /// Maintenance/test-only: restart the sequence at zero. Callers must
    /// serialize this against in-flight `next` calls.
    async fn reset(&self) -> Result<(), StoreError>;
}
