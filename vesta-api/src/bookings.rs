use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use vesta_core::booking::PersonalInfo;
use vesta_core::BookingHash;
use vesta_engine::{CreateBookingRequest, CreatedBooking, EngineError};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking", post(create_booking).delete(delete_booking))
        .route("/booking/emailInfo", post(email_info))
        .route("/booking/{booking_hash}", get(get_booking))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingBody {
    guest_eth_address: String,
    room_type: i32,
    guest_count: u32,
    payment_type: String,
    personal_info: PersonalInfo,
    #[serde(rename = "g-recaptcha-response")]
    g_recaptcha_response: Option<String>,
}

async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> Result<Json<CreatedBooking>, AppError> {
    let token = match body.g_recaptcha_response.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AppError::NoRecaptcha),
    };
    state
        .captcha
        .verify(token)
        .await
        .map_err(|e| AppError::Recaptcha(e.to_string()))?;

    let created = state
        .engine
        .create(
            CreateBookingRequest {
                guest_eth_address: body.guest_eth_address,
                room_type: body.room_type,
                guest_count: body.guest_count,
                payment_type: body.payment_type,
                personal_info: body.personal_info,
            },
            &state.signer_key,
        )
        .await?;

    info!(
        booking_hash = %created.booking.booking_hash,
        booking_index = created.booking_index,
        "booking request accepted"
    );
    Ok(Json(created))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetBookingQuery {
    booking_index: Option<i64>,
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_hash): Path<String>,
    Query(query): Query<GetBookingQuery>,
) -> Result<Json<vesta_core::Booking>, AppError> {
    // A malformed hash can never name a booking.
    let hash = BookingHash::parse(&booking_hash).map_err(|_| EngineError::NotFound)?;
    let booking = state.engine.get(&hash).await?;
    // A stale or mismatched index is treated as absence, never as a hint.
    if let Some(index) = query.booking_index {
        if index != booking.booking_index {
            return Err(EngineError::NotFound.into());
        }
    }
    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingHashBody {
    booking_hash: String,
}

#[derive(Debug, Serialize)]
struct EmailInfoResponse {
    status: &'static str,
}

async fn email_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BookingHashBody>,
) -> Result<Json<EmailInfoResponse>, AppError> {
    if !state.email_limiter.allow(&caller_key(&headers)).await {
        return Err(AppError::RateLimit);
    }

    let hash = BookingHash::parse(&body.booking_hash)
        .map_err(|e| EngineError::SendFailed(e.to_string()))?;
    state.engine.request_notification(&hash).await?;
    Ok(Json(EmailInfoResponse { status: "ok" }))
}

async fn delete_booking(
    State(state): State<AppState>,
    Json(body): Json<BookingHashBody>,
) -> Result<Json<Value>, AppError> {
    // Malformed hashes get the same answer as unknown ones.
    let hash = BookingHash::parse(&body.booking_hash).map_err(|_| EngineError::BookingNotFound)?;
    let tx = state.engine.delete(&hash).await?;
    Ok(Json(json!({ "tx": tx })))
}

/// Rate-limit key for a caller: the nearest client address we can see.
fn caller_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
