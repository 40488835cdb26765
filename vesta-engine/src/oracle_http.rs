use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use vesta_core::{OracleError, PaymentKind, PriceOracle, RateSnapshot};

/// Price oracle over a simple HTTP quote endpoint:
/// `GET {url}?asset={native|token}` -> `{"fiatCentsPerUnit": <u64>}`.
/// Any transport or decode failure surfaces as `Unavailable`, which the
/// engine maps to an immediate `PriceUnavailable` for the request; the
/// request itself is never retried.
pub struct HttpPriceOracle {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    fiat_cents_per_unit: u64,
}

impl HttpPriceOracle {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            timeout,
        }
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn current_rate(&self, kind: PaymentKind) -> Result<RateSnapshot, OracleError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("asset", kind.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        Ok(RateSnapshot {
            kind,
            fiat_cents_per_unit: quote.fiat_cents_per_unit,
            fetched_at: Utc::now(),
        })
    }
}
