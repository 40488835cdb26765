use crate::booking::PaymentKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("price oracle unavailable: {0}")]
    Unavailable(String),
}

/// Point-in-time exchange rate: fiat cents for one whole coin/token.
/// A snapshot fetched at creation is embedded into the booking and never
/// refreshed; consumers must not assume stability between calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub kind: PaymentKind,
    pub fiat_cents_per_unit: u64,
    pub fetched_at: DateTime<Utc>,
}

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn current_rate(&self, kind: PaymentKind) -> Result<RateSnapshot, OracleError>;
}

/// Fixed-rate oracle for tests and local development.
pub struct FixedRateOracle {
    pub fiat_cents_per_unit: u64,
}

#[async_trait]
impl PriceOracle for FixedRateOracle {
    async fn current_rate(&self, kind: PaymentKind) -> Result<RateSnapshot, OracleError> {
        Ok(RateSnapshot {
            kind,
            fiat_cents_per_unit: self.fiat_cents_per_unit,
            fetched_at: Utc::now(),
        })
    }
}
