use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vesta_core::AddressError;
use vesta_engine::EngineError;

/// API-level error carrying the envelope code the client switches on.
#[derive(Debug)]
pub enum AppError {
    NoRecaptcha,
    Recaptcha(String),
    Engine(EngineError),
    RateLimit,
    Anyhow(anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NoRecaptcha => (
                StatusCode::BAD_REQUEST,
                "#noRecaptcha",
                "captcha response is required".to_string(),
            ),
            AppError::Recaptcha(msg) => (StatusCode::BAD_REQUEST, "#recaptcha", msg.clone()),
            AppError::RateLimit => (
                StatusCode::TOO_MANY_REQUESTS,
                "#rateLimit",
                "too many requests".to_string(),
            ),
            AppError::Engine(e) => {
                let (status, code) = match e {
                    EngineError::InvalidAddress(AddressError::InvalidChecksum) => {
                        (StatusCode::BAD_REQUEST, "#guestEthAddressChecksum")
                    }
                    EngineError::InvalidAddress(AddressError::InvalidFormat) => {
                        (StatusCode::BAD_REQUEST, "#invalidAddress")
                    }
                    EngineError::InvalidRoomType(_) => {
                        (StatusCode::BAD_REQUEST, "#invalidRoomType")
                    }
                    EngineError::InvalidGuestCount(_) => {
                        (StatusCode::BAD_REQUEST, "#invalidGuestCount")
                    }
                    EngineError::UnsupportedPaymentType(_) => {
                        (StatusCode::BAD_REQUEST, "#invalidPaymentType")
                    }
                    EngineError::PriceUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "#priceOracle")
                    }
                    EngineError::DuplicateBookingHash | EngineError::DuplicateGuestAddress => {
                        (StatusCode::CONFLICT, "#duplicate")
                    }
                    EngineError::NotFound => (StatusCode::NOT_FOUND, "#notFound"),
                    EngineError::BookingNotFound => (StatusCode::NOT_FOUND, "#bookingNotFound"),
                    EngineError::SendFailed(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "#sendBookingInfoFail")
                    }
                    EngineError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "#internal"),
                };
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR
                    && matches!(e, EngineError::Store(_))
                {
                    tracing::error!("store error behind request: {}", e);
                    "internal server error".to_string()
                } else {
                    e.to_string()
                };
                (status, code, message)
            }
            AppError::Anyhow(err) => {
                tracing::error!("internal server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "#internal",
                    "internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = Json(json!({
            "error": { "code": code, "message": message },
        }));
        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
