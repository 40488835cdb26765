//! In-memory store and allocator: the default for tests and small
//! single-node deployments. One mutex guards the whole map, so every
//! operation is a single atomic critical section; nothing is held
//! across an await.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use vesta_core::booking::{Booking, BookingStatus};
use vesta_core::repository::{BookingStore, IndexAllocator, StoreError};
use vesta_core::BookingHash;

#[derive(Default)]
pub struct InMemoryBookingStore {
    inner: Mutex<HashMap<BookingHash, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_active(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Pending | BookingStatus::Approved)
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(&booking.booking_hash) {
            return Err(StoreError::DuplicateBookingHash);
        }
        if map
            .values()
            .any(|b| is_active(b.status) && b.guest_eth_address == booking.guest_eth_address)
        {
            return Err(StoreError::DuplicateGuestAddress);
        }
        map.insert(booking.booking_hash, booking.clone());
        Ok(())
    }

    async fn get(&self, hash: &BookingHash) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.lock().unwrap().get(hash).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<Booking>, StoreError> {
        let map = self.inner.lock().unwrap();
        let mut pending: Vec<Booking> = map
            .values()
            .filter(|b| b.status == BookingStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|b| b.booking_index);
        Ok(pending)
    }

    async fn approve(&self, hash: &BookingHash, transaction_ref: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(hash) {
            Some(b) if b.status == BookingStatus::Pending => {
                b.status = BookingStatus::Approved;
                b.payment.transaction_ref = Some(transaction_ref.to_string());
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut map = self.inner.lock().unwrap();
        let before = map.len();
        map.retain(|_, b| !(b.status == BookingStatus::Pending && b.signature_timestamp < now));
        Ok((before - map.len()) as u64)
    }

    async fn delete_approved(&self, hash: &BookingHash) -> Result<bool, StoreError> {
        let mut map = self.inner.lock().unwrap();
        match map.get(hash) {
            Some(b) if b.status == BookingStatus::Approved => {
                map.remove(hash);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct InMemoryIndexAllocator {
    counter: AtomicI64,
}

impl InMemoryIndexAllocator {
    pub fn new() -> Self {
        Self {
            counter: AtomicI64::new(0),
        }
    }
}

impl Default for InMemoryIndexAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexAllocator for InMemoryIndexAllocator {
    async fn next(&self) -> Result<i64, StoreError> {
        Ok(self.counter.fetch_add(1, Ordering::SeqCst))
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.counter.store(0, Ordering::SeqCst);
        Ok(())
    }
}
