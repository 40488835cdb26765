use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    #[error("captcha rejected: {0}")]
    Rejected(String),
}

/// Boundary collaborator: the core only needs a pass/fail decision.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError>;
}

/// reCAPTCHA siteverify-shaped verifier.
pub struct RecaptchaHttpVerifier {
    http: reqwest::Client,
    verify_url: String,
    secret: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl RecaptchaHttpVerifier {
    pub fn new(verify_url: String, secret: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            verify_url,
            secret,
            timeout,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaHttpVerifier {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        let response = self
            .http
            .post(&self.verify_url)
            .timeout(self.timeout)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| CaptchaError::Rejected(e.to_string()))?;

        let parsed: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| CaptchaError::Rejected(e.to_string()))?;

        if parsed.success {
            Ok(())
        } else {
            Err(CaptchaError::Rejected(parsed.error_codes.join(", ")))
        }
    }
}

/// Accepts any non-empty token. Development and tests only.
pub struct InsecureVerifier;

#[async_trait]
impl CaptchaVerifier for InsecureVerifier {
    async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        if token.is_empty() {
            Err(CaptchaError::Rejected("empty token".into()))
        } else {
            Ok(())
        }
    }
}
