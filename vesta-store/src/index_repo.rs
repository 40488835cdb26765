use async_trait::async_trait;
use sqlx::{PgPool, Row};
use vesta_core::repository::{IndexAllocator, StoreError};

/// Booking-index allocator backed by a Postgres sequence, so allocation
/// is serialized by the database and survives process restarts.
pub struct PostgresIndexAllocator {
    pool: PgPool,
}

impl PostgresIndexAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IndexAllocator for PostgresIndexAllocator {
    async fn next(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT nextval('booking_index_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        row.try_get::<i64, _>(0)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("ALTER SEQUENCE booking_index_seq RESTART")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}
