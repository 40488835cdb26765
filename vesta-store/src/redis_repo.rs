use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use redis::RedisResult;
use tracing::warn;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Atomic INCR + EXPIRE window: the first hit in a window creates the
    /// key, every hit bumps the counter, the key dies with the window.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// Redis-backed limiter for multi-instance deployments.
pub struct RedisRateLimiter {
    client: RedisClient,
    prefix: String,
    limit: i64,
    window_seconds: i64,
}

impl RedisRateLimiter {
    pub fn new(client: RedisClient, prefix: &str, limit: i64, window_seconds: i64) -> Self {
        Self {
            client,
            prefix: prefix.to_string(),
            limit,
            window_seconds,
        }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, key: &str) -> bool {
        let redis_key = format!("{}:{}", self.prefix, key);
        match self
            .client
            .check_rate_limit(&redis_key, self.limit, self.window_seconds)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                // Fail open.
                warn!("rate limiter backend error: {}", e);
                true
            }
        }
    }
}
