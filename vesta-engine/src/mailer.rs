use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;
use vesta_core::Booking;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail dispatch failed: {0}")]
    Dispatch(String),
}

/// Outbound confirmation-mail collaborator. Fire-and-forget from the
/// engine's point of view: dispatch failure never rolls back a booking.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send (or re-send) the booking confirmation. Returns the provider's
    /// message id.
    async fn send_booking_info(&self, booking: &Booking) -> Result<String, MailError>;
}

/// HTTP mail-API client (JSON POST, returns `{"messageId": "..."}`).
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: String,
    from_address: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, from_address: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            from_address,
            timeout,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_booking_info(&self, booking: &Booking) -> Result<String, MailError> {
        let body = json!({
            "from": self.from_address,
            "to": booking.personal_info.email,
            "template": "booking-info",
            "bookingHash": booking.booking_hash.to_string(),
            "bookingIndex": booking.booking_index,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Dispatch(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailError::Dispatch(e.to_string()))?;

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| MailError::Dispatch(e.to_string()))?;

        Ok(parsed.message_id)
    }
}

/// Development mailer: logs instead of sending.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_booking_info(&self, booking: &Booking) -> Result<String, MailError> {
        info!(
            booking_hash = %booking.booking_hash,
            to = %booking.personal_info.email,
            "booking confirmation mail (log only)"
        );
        Ok(format!("log-{}", booking.booking_index))
    }
}
