use crate::captcha::CaptchaVerifier;
use std::sync::Arc;
use vesta_engine::BookingLifecycleEngine;
use vesta_store::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingLifecycleEngine>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    /// Per-caller limiter for the notification-resend route.
    pub email_limiter: Arc<dyn RateLimiter>,
    /// Server-side key folded into booking-hash derivation.
    pub signer_key: String,
}
