use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use vesta_core::booking::{Booking, BookingStatus, PaymentKind, PaymentTerms, PersonalInfo};
use vesta_core::repository::{BookingStore, StoreError};
use vesta_core::{BookingHash, EthAddress};

pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_hash: String,
    guest_eth_address: String,
    room_type: i32,
    guest_count: i32,
    full_name: String,
    email: String,
    birth_date: NaiveDate,
    phone: String,
    amount_wei: String,
    payment_kind: String,
    transaction_ref: Option<String>,
    signature_timestamp: DateTime<Utc>,
    status: String,
    booking_index: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, StoreError> {
        let booking_hash = BookingHash::parse(&self.booking_hash)
            .map_err(|e| StoreError::Backend(format!("corrupt booking_hash: {e}")))?;
        let guest_eth_address = EthAddress::parse(&self.guest_eth_address)
            .map_err(|e| StoreError::Backend(format!("corrupt guest_eth_address: {e}")))?;
        let amount_wei: u128 = self
            .amount_wei
            .parse()
            .map_err(|_| StoreError::Backend("corrupt amount_wei".into()))?;
        let kind = PaymentKind::parse(&self.payment_kind)
            .ok_or_else(|| StoreError::Backend(format!("corrupt payment_kind: {}", self.payment_kind)))?;

        Ok(Booking {
            booking_hash,
            guest_eth_address,
            room_type: self.room_type,
            guest_count: self.guest_count as u32,
            personal_info: PersonalInfo {
                full_name: self.full_name,
                email: self.email,
                birth_date: self.birth_date,
                phone: self.phone,
            },
            payment: PaymentTerms {
                amount_wei,
                kind,
                transaction_ref: self.transaction_ref,
            },
            signature_timestamp: self.signature_timestamp,
            status: BookingStatus::from_str(&self.status),
            booking_index: self.booking_index,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "booking_hash, guest_eth_address, room_type, guest_count, \
     full_name, email, birth_date, phone, amount_wei, payment_kind, transaction_ref, \
     signature_timestamp, status, booking_index, created_at, updated_at";

fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            // The constraint name tells us which uniqueness rule fired.
            return match db.constraint() {
                Some("bookings_active_guest_address") => StoreError::DuplicateGuestAddress,
                _ => StoreError::DuplicateBookingHash,
            };
        }
    }
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (booking_hash, guest_eth_address, room_type, guest_count,
                full_name, email, birth_date, phone, amount_wei, payment_kind,
                transaction_ref, signature_timestamp, status, booking_index,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.booking_hash.to_string())
        .bind(booking.guest_eth_address.to_checksum())
        .bind(booking.room_type)
        .bind(booking.guest_count as i32)
        .bind(&booking.personal_info.full_name)
        .bind(&booking.personal_info.email)
        .bind(booking.personal_info.birth_date)
        .bind(&booking.personal_info.phone)
        .bind(booking.payment.amount_wei.to_string())
        .bind(booking.payment.kind.as_str())
        .bind(&booking.payment.transaction_ref)
        .bind(booking.signature_timestamp)
        .bind(booking.status.as_str())
        .bind(booking.booking_index)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }

    async fn get(&self, hash: &BookingHash) -> Result<Option<Booking>, StoreError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM bookings WHERE booking_hash = $1"
        ))
        .bind(hash.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM bookings WHERE status = 'pending' ORDER BY booking_index"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn approve(&self, hash: &BookingHash, transaction_ref: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'approved', transaction_ref = $2, updated_at = now()
            WHERE booking_hash = $1 AND status = 'pending'
            "#,
        )
        .bind(hash.to_string())
        .bind(transaction_ref)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM bookings WHERE status = 'pending' AND signature_timestamp < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(result.rows_affected())
    }

    async fn delete_approved(&self, hash: &BookingHash) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM bookings WHERE booking_hash = $1 AND status = 'approved'")
                .bind(hash.to_string())
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;

        Ok(result.rows_affected() == 1)
    }
}
