use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-caller request limiter consulted by the API layer. Implementations
/// fail open: a broken limiter backend never takes the route down.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn allow(&self, key: &str) -> bool;
}

/// True sliding-window limiter held in process memory.
pub struct SlidingWindowLimiter {
    max: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap();

        // Sweep every caller: drop hits outside the window, and drop
        // callers with none left so the map stays bounded by active keys.
        hits.retain(|_, entry| {
            while let Some(front) = entry.front() {
                if now.duration_since(*front) > self.window {
                    entry.pop_front();
                } else {
                    break;
                }
            }
            !entry.is_empty()
        });

        let entry = hits.entry(key.to_string()).or_default();
        if entry.len() < self.max as usize {
            entry.push_back(now);
            true
        } else {
            false
        }
    }
}
