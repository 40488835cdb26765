use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use vesta_api::captcha::InsecureVerifier;
use vesta_api::{app, AppState};
use vesta_chain::{ChainParams, TransactionBuilder};
use vesta_core::oracle::FixedRateOracle;
use vesta_core::repository::BookingStore;
use vesta_core::EthAddress;
use vesta_engine::{BookingLifecycleEngine, EngineRules, LogMailer};
use vesta_store::{
    InMemoryBookingStore, InMemoryIndexAllocator, SlidingWindowLimiter,
};

const GUEST_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const GUEST_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

fn test_app() -> (Router, Arc<InMemoryBookingStore>) {
    let store = Arc::new(InMemoryBookingStore::new());
    let builder = TransactionBuilder::new(ChainParams {
        booking_contract: EthAddress::parse("0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB").unwrap(),
        token_contract: EthAddress::parse("0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb").unwrap(),
        approve_gas: 60_000,
        book_gas: 220_000,
        cancel_gas: 90_000,
    });
    let engine = Arc::new(BookingLifecycleEngine::new(
        store.clone(),
        Arc::new(InMemoryIndexAllocator::new()),
        Arc::new(FixedRateOracle {
            fiat_cents_per_unit: 240_000,
        }),
        Arc::new(LogMailer),
        builder,
        EngineRules {
            signature_ttl_minutes: 30,
            max_guests: 4,
            room_prices: HashMap::from([(1, 12_000), (2, 20_000)]),
        },
    ));

    let state = AppState {
        engine,
        captcha: Arc::new(InsecureVerifier),
        email_limiter: Arc::new(SlidingWindowLimiter::new(3, Duration::from_secs(60))),
        signer_key: "test-signer-key".to_string(),
    };
    (app(state), store)
}

fn create_body(address: &str, room_type: i32, payment_type: &str) -> Value {
    json!({
        "guestEthAddress": address,
        "roomType": room_type,
        "guestCount": 2,
        "paymentType": payment_type,
        "personalInfo": {
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "birthDate": "1990-12-10",
            "phone": "+44 20 7946 0000",
        },
        "g-recaptcha-response": "dummy-token",
    })
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn create_returns_booking_index_and_ordered_token_txs() {
    let (app, _) = test_app();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_A, 1, "token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["bookingIndex"].is_i64() || body["bookingIndex"].is_u64());
    let txs = body["txs"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert!(txs[0]["data"].as_str().unwrap().starts_with("0x095ea7b3"));
    assert_eq!(txs[1]["value"], "0");
}

#[tokio::test]
async fn missing_captcha_token_is_rejected_up_front() {
    let (app, store) = test_app();
    let mut body = create_body(GUEST_A, 1, "native");
    body.as_object_mut().unwrap().remove("g-recaptcha-response");

    let response = app
        .oneshot(json_request(Method::POST, "/booking", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response_json(response).await), "#noRecaptcha");
    assert!(store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_checksum_maps_to_its_own_code() {
    let (app, store) = test_app();
    let bad = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(bad, 1, "native"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_code(&response_json(response).await),
        "#guestEthAddressChecksum"
    );
    assert!(store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn lowercase_address_fails_the_checksum_check() {
    let (app, store) = test_app();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(&GUEST_A.to_lowercase(), 1, "native"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_code(&response_json(response).await),
        "#guestEthAddressChecksum"
    );
    assert!(store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_room_type_maps_to_its_own_code() {
    let (app, _) = test_app();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_A, -1, "native"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response_json(response).await), "#invalidRoomType");
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let (app, _) = test_app();
    let body = create_body(GUEST_A, 1, "native");

    let first = app
        .clone()
        .oneshot(json_request(Method::POST, "/booking", &body))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(json_request(Method::POST, "/booking", &body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(&response_json(second).await), "#duplicate");
}

#[tokio::test]
async fn get_round_trips_a_created_booking() {
    let (app, _) = test_app();
    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_B, 2, "native"),
        ))
        .await
        .unwrap();
    let created = response_json(created).await;
    let hash = created["booking"]["bookingHash"].as_str().unwrap();
    let index = created["bookingIndex"].as_i64().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/booking/{hash}?bookingIndex={index}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["bookingHash"], *hash);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn get_with_mismatched_index_is_not_found() {
    let (app, _) = test_app();
    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_A, 1, "native"),
        ))
        .await
        .unwrap();
    let created = response_json(created).await;
    let hash = created["booking"]["bookingHash"].as_str().unwrap();
    let wrong = created["bookingIndex"].as_i64().unwrap() + 1;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/booking/{hash}?bookingIndex={wrong}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response_json(response).await), "#notFound");
}

#[tokio::test]
async fn get_unknown_hash_is_not_found() {
    let (app, _) = test_app();
    let unknown = format!("0x{}", "44".repeat(32));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/booking/{unknown}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response_json(response).await), "#notFound");
}

#[tokio::test]
async fn email_info_allows_three_then_rate_limits() {
    let (app, _) = test_app();
    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_A, 1, "native"),
        ))
        .await
        .unwrap();
    let hash = response_json(created).await["booking"]["bookingHash"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..3 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/booking/emailInfo")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::from(json!({ "bookingHash": hash }).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["status"], "ok");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/booking/emailInfo")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "198.51.100.7")
        .body(Body::from(json!({ "bookingHash": hash }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_code(&response_json(response).await), "#rateLimit");
}

#[tokio::test]
async fn delete_pending_booking_is_booking_not_found() {
    let (app, _) = test_app();
    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_A, 1, "native"),
        ))
        .await
        .unwrap();
    let hash = response_json(created).await["booking"]["bookingHash"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/booking",
            &json!({ "bookingHash": hash }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        error_code(&response_json(response).await),
        "#bookingNotFound"
    );
}

#[tokio::test]
async fn delete_approved_booking_returns_refund_tx() {
    let (app, store) = test_app();
    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/booking",
            &create_body(GUEST_A, 1, "native"),
        ))
        .await
        .unwrap();
    let hash = response_json(created).await["booking"]["bookingHash"]
        .as_str()
        .unwrap()
        .to_string();

    let parsed = hash.parse::<vesta_core::BookingHash>().unwrap();
    store.approve(&parsed, "0xfeed").await.unwrap();

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/booking",
            &json!({ "bookingHash": hash }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["tx"]["value"], "0");
    assert!(body["tx"]["data"].as_str().unwrap().starts_with("0x"));
}
