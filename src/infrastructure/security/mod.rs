pub mod rate_limiter;
pub mod upload_policy;

pub use rate_limiter::{InMemoryRateLimitStore, RateLimitStore, RateLimiter, RedisRateLimitStore};
pub use upload_policy::{MAX_PROOF_SIZE_BYTES, UploadError, UploadPolicy};
