use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Counter state for one key after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u64,
    pub reset_in: Duration,
}

/// Counter store keyed by client identity, with per-key expiry.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` and return the total inside the current window.
    async fn hit(&self, key: &str, window: Duration) -> anyhow::Result<WindowCount>;
}

struct Bucket {
    count: u64,
    reset_at: Instant,
}

/// Process-local store. Increments are serialised by the mutex.
pub struct InMemoryRateLimitStore {
    buckets: Mutex<HashMap<String, Bucket>>,
    max_buckets: usize,
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl InMemoryRateLimitStore {
    pub fn new(max_buckets: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_buckets: max_buckets.max(1),
        }
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> anyhow::Result<WindowCount> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        if buckets.len() >= self.max_buckets && !buckets.contains_key(key) {
            let before = buckets.len();
            buckets.retain(|_, bucket| bucket.reset_at > now);
            if buckets.len() >= self.max_buckets {
                let oldest = buckets
                    .iter()
                    .min_by_key(|(_, bucket)| bucket.reset_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    buckets.remove(&oldest);
                }
            }
            tracing::debug!(evicted = before - buckets.len(), "Rate limit buckets evicted");
        }

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            reset_at: now + window,
        });
        if now >= bucket.reset_at {
            bucket.count = 0;
            bucket.reset_at = now + window;
        }
        bucket.count += 1;

        Ok(WindowCount {
            count: bucket.count,
            reset_in: bucket.reset_at.saturating_duration_since(now),
        })
    }
}

/// Shared store for running several instances behind one limit.
pub struct RedisRateLimitStore {
    conn: ConnectionManager,
}

impl RedisRateLimitStore {
    pub async fn connect(client: Client) -> anyhow::Result<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

/// Turn the counter and `TTL` reply after an `INCR` into a window. The flag is set when the key
/// has no expiry (fresh key, or one that lost it) and the window must be (re)armed.
fn redis_window(count: u64, ttl: i64, window_secs: u64) -> (WindowCount, bool) {
    let rearm = ttl < 0;
    let reset_secs = if rearm { window_secs } else { (ttl as u64).max(1) };
    (
        WindowCount {
            count,
            reset_in: Duration::from_secs(reset_secs),
        },
        rearm,
    )
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> anyhow::Result<WindowCount> {
        let mut conn = self.conn.clone();
        let k = format!("rl:{}", key);
        let window_secs = window.as_secs().max(1);

        let count: u64 = conn.incr(&k, 1_u64).await?;
        let ttl: i64 = conn.ttl(&k).await?;
        let (hit, rearm) = redis_window(count, ttl, window_secs);
        if rearm {
            let _: () = conn.expire(&k, window_secs as i64).await?;
        }
        Ok(hit)
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: Duration,
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: u32, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Record a request from `client` and decide whether it may proceed.
    ///
    /// A store failure lets the request through.
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        match self.store.hit(client, self.window).await {
            Ok(hit) => {
                let limit = u64::from(self.limit);
                RateLimitDecision {
                    allowed: hit.count <= limit,
                    limit: self.limit,
                    remaining: limit.saturating_sub(hit.count) as u32,
                    reset_in: hit.reset_in,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Rate limit store unavailable, admitting request");
                RateLimitDecision {
                    allowed: true,
                    limit: self.limit,
                    remaining: self.limit,
                    reset_in: self.window,
                }
            }
        }
    }
}
