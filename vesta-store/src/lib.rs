pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod index_repo;
pub mod memory;
pub mod rate_limit;
pub mod redis_repo;

pub use booking_repo::PostgresBookingStore;
pub use database::DbClient;
pub use index_repo::PostgresIndexAllocator;
pub use memory::{InMemoryBookingStore, InMemoryIndexAllocator};
pub use rate_limit::{RateLimiter, SlidingWindowLimiter};
pub use redis_repo::{RedisClient, RedisRateLimiter};
