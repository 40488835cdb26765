use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vesta_api::captcha::RecaptchaHttpVerifier;
use vesta_api::{app, AppState};
use vesta_chain::{ChainParams, EthRpcScanner, TransactionBuilder};
use vesta_core::repository::{BookingStore, IndexAllocator};
use vesta_core::EthAddress;
use vesta_engine::{
    spawn_confirmation_watcher, spawn_expiry_sweeper, BookingLifecycleEngine, EngineRules,
    HttpMailer, HttpPriceOracle,
};
use vesta_store::app_config::Config;
use vesta_store::{
    DbClient, PostgresBookingStore, PostgresIndexAllocator, RedisClient, RedisRateLimiter,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vesta_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Vesta API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    let booking_contract = EthAddress::parse(&config.chain.booking_contract)
        .expect("chain.booking_contract is not a valid address");
    let token_contract = EthAddress::parse(&config.chain.token_contract)
        .expect("chain.token_contract is not a valid address");

    let builder = TransactionBuilder::new(ChainParams {
        booking_contract,
        token_contract,
        approve_gas: config.chain.approve_gas,
        book_gas: config.chain.book_gas,
        cancel_gas: config.chain.cancel_gas,
    });

    let store: Arc<dyn BookingStore> = Arc::new(PostgresBookingStore::new(db.pool.clone()));
    let allocator: Arc<dyn IndexAllocator> = Arc::new(PostgresIndexAllocator::new(db.pool.clone()));
    let oracle = Arc::new(HttpPriceOracle::new(
        config.oracle.url.clone(),
        Duration::from_secs(config.oracle.timeout_seconds),
    ));
    let mailer = Arc::new(HttpMailer::new(
        config.mailer.endpoint.clone(),
        config.mailer.from_address.clone(),
        Duration::from_secs(config.mailer.timeout_seconds),
    ));

    let room_prices: HashMap<i32, u64> = config
        .business_rules
        .room_prices
        .iter()
        .filter_map(|(k, v)| k.parse::<i32>().ok().map(|room_type| (room_type, *v)))
        .collect();

    let engine = Arc::new(BookingLifecycleEngine::new(
        store.clone(),
        allocator,
        oracle,
        mailer,
        builder,
        EngineRules {
            signature_ttl_minutes: config.business_rules.signature_ttl_minutes,
            max_guests: config.business_rules.max_guests,
            room_prices,
        },
    ));

    // Reconciliation: two independent timers, each with its own
    // cancellation handle, cancelled on shutdown.
    let scanner = Arc::new(EthRpcScanner::new(
        config.chain.rpc_url.clone(),
        booking_contract,
        Duration::from_secs(config.chain.scan_timeout_seconds),
    ));
    let watcher_token = CancellationToken::new();
    let sweeper_token = CancellationToken::new();
    let watcher = spawn_confirmation_watcher(
        store.clone(),
        scanner,
        Duration::from_secs(config.chain.confirm_interval_seconds),
        watcher_token.clone(),
    );
    let sweeper = spawn_expiry_sweeper(
        store.clone(),
        Duration::from_secs(config.chain.expiry_interval_seconds),
        sweeper_token.clone(),
    );

    let state = AppState {
        engine,
        captcha: Arc::new(RecaptchaHttpVerifier::new(
            config.captcha.verify_url.clone(),
            config.captcha.secret.clone(),
            Duration::from_secs(5),
        )),
        email_limiter: Arc::new(RedisRateLimiter::new(
            redis,
            "ratelimit:emailInfo",
            config.business_rules.email_info_limit as i64,
            config.business_rules.email_info_window_seconds as i64,
        )),
        signer_key: config.signer.key.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .unwrap();

    watcher_token.cancel();
    sweeper_token.cancel();
    let _ = watcher.await;
    let _ = sweeper.await;
}
