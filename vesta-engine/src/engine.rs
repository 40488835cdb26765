use crate::mailer::Mailer;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use vesta_chain::builder::BuildError;
use vesta_chain::{TransactionBuilder, UnsignedTransaction};
use vesta_core::booking::{Booking, BookingStatus, PaymentKind, PaymentTerms, PersonalInfo};
use vesta_core::hash::HashContent;
use vesta_core::repository::{BookingStore, IndexAllocator, StoreError};
use vesta_core::{AddressError, BookingHash, EthAddress, OracleError, PriceOracle};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error("room type {0} does not reference a valid room category")]
    InvalidRoomType(i32),
    #[error("guest count {0} is out of range")]
    InvalidGuestCount(u32),
    #[error("unsupported payment type: {0}")]
    UnsupportedPaymentType(String),
    #[error("price unavailable: {0}")]
    PriceUnavailable(String),
    #[error("a booking with this content already exists")]
    DuplicateBookingHash,
    #[error("this guest address already holds an active booking")]
    DuplicateGuestAddress,
    #[error("booking not found")]
    NotFound,
    /// Covers both an unknown hash and a booking outside the approved
    /// state. The two cases must render identically.
    #[error("booking not found")]
    BookingNotFound,
    #[error("could not send booking info: {0}")]
    SendFailed(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateBookingHash => EngineError::DuplicateBookingHash,
            StoreError::DuplicateGuestAddress => EngineError::DuplicateGuestAddress,
            StoreError::Backend(msg) => EngineError::Store(msg),
        }
    }
}

/// Validated-at-the-boundary creation request. `payment_type` stays a
/// string until the engine parses it, so unsupported values surface as
/// the domain error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub guest_eth_address: String,
    pub room_type: i32,
    pub guest_count: u32,
    pub payment_type: String,
    pub personal_info: PersonalInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBooking {
    pub booking: Booking,
    pub booking_index: i64,
    pub txs: Vec<UnsignedTransaction>,
}

/// Engine-level policy, converted from `[business_rules]` config.
#[derive(Debug, Clone)]
pub struct EngineRules {
    pub signature_ttl_minutes: i64,
    pub max_guests: u32,
    pub room_prices: HashMap<i32, u64>,
}

impl EngineRules {
    fn room_price_cents(&self, room_type: i32) -> Option<u64> {
        if room_type <= 0 {
            return None;
        }
        self.room_prices.get(&room_type).copied()
    }
}

/// Owns the booking state machine: `pending -> approved` (watcher),
/// `pending -> expired` (sweeper), `approved -> deleted` (explicit).
/// Every guard is a conditional update inside the store, so concurrent
/// callers and reconciliation runs cannot double-apply a transition.
pub struct BookingLifecycleEngine {
    store: Arc<dyn BookingStore>,
    allocator: Arc<dyn IndexAllocator>,
    oracle: Arc<dyn PriceOracle>,
    mailer: Arc<dyn Mailer>,
    builder: TransactionBuilder,
    rules: EngineRules,
}

impl BookingLifecycleEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        allocator: Arc<dyn IndexAllocator>,
        oracle: Arc<dyn PriceOracle>,
        mailer: Arc<dyn Mailer>,
        builder: TransactionBuilder,
        rules: EngineRules,
    ) -> Self {
        Self {
            store,
            allocator,
            oracle,
            mailer,
            builder,
            rules,
        }
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    /// Validate, price, build transactions, allocate an index and
    /// persist a pending booking. Identical resubmission is NOT
    /// idempotent: the atomic insert surfaces a duplicate error instead
    /// of returning the original record.
    pub async fn create(
        &self,
        request: CreateBookingRequest,
        signing_key: &str,
    ) -> Result<CreatedBooking, EngineError> {
        let guest = EthAddress::parse(&request.guest_eth_address)?;
        let fiat_cents = self
            .rules
            .room_price_cents(request.room_type)
            .ok_or(EngineError::InvalidRoomType(request.room_type))?;
        if request.guest_count == 0 || request.guest_count > self.rules.max_guests {
            return Err(EngineError::InvalidGuestCount(request.guest_count));
        }
        let kind = PaymentKind::parse(&request.payment_type)
            .ok_or_else(|| EngineError::UnsupportedPaymentType(request.payment_type.clone()))?;

        // The snapshot is embedded into the booking and never refreshed.
        let rate = self
            .oracle
            .current_rate(kind)
            .await
            .map_err(|OracleError::Unavailable(msg)| EngineError::PriceUnavailable(msg))?;
        let amount = self
            .builder
            .amount_in_units(fiat_cents, &rate)
            .map_err(|e| match e {
                BuildError::UnsupportedPaymentType(t) => EngineError::UnsupportedPaymentType(t),
                BuildError::ZeroRate | BuildError::ZeroAmount => {
                    EngineError::PriceUnavailable(e.to_string())
                }
            })?;

        let booking_hash = BookingHash::derive(
            &HashContent {
                guest_eth_address: &guest,
                room_type: request.room_type,
                guest_count: request.guest_count,
                payment_kind: kind,
                personal_info: &request.personal_info,
            },
            signing_key,
        );

        let booking_index = self.allocator.next().await?;
        let txs = self.builder.payment_sequence(kind, &booking_hash, amount);

        let now = Utc::now();
        let booking = Booking {
            booking_hash,
            guest_eth_address: guest,
            room_type: request.room_type,
            guest_count: request.guest_count,
            personal_info: request.personal_info,
            payment: PaymentTerms {
                amount_wei: amount,
                kind,
                transaction_ref: None,
            },
            signature_timestamp: now + Duration::minutes(self.rules.signature_ttl_minutes),
            status: BookingStatus::Pending,
            booking_index,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&booking).await?;
        info!(booking_hash = %booking.booking_hash, booking_index, "booking created");

        // Best effort: the booking is already durable, a failed mail
        // must not fail the request.
        let mailer = self.mailer.clone();
        let for_mail = booking.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_booking_info(&for_mail).await {
                error!(booking_hash = %for_mail.booking_hash, "confirmation mail failed: {}", e);
            }
        });

        Ok(CreatedBooking {
            booking,
            booking_index,
            txs,
        })
    }

    pub async fn get(&self, hash: &BookingHash) -> Result<Booking, EngineError> {
        self.store.get(hash).await?.ok_or(EngineError::NotFound)
    }

    /// Re-send the confirmation mail. Rate limiting is the API layer's
    /// concern and happens before this is called.
    pub async fn request_notification(&self, hash: &BookingHash) -> Result<String, EngineError> {
        let booking = self
            .store
            .get(hash)
            .await?
            .ok_or_else(|| EngineError::SendFailed("unknown booking".into()))?;
        self.mailer
            .send_booking_info(&booking)
            .await
            .map_err(|e| EngineError::SendFailed(e.to_string()))
    }

    /// Guest-initiated cancellation, only valid from `approved` (a
    /// pending booking has no on-chain payment to refund). Returns the
    /// unsigned refund transaction.
    pub async fn delete(&self, hash: &BookingHash) -> Result<UnsignedTransaction, EngineError> {
        if !self.store.delete_approved(hash).await? {
            return Err(EngineError::BookingNotFound);
        }
        info!(booking_hash = %hash, "approved booking deleted, refund tx issued");
        Ok(self.builder.refund_transaction(hash))
    }
}
