mod memory;
mod redis_cache;

use async_trait::async_trait;

pub use memory::MemoryListingCache;
pub use redis_cache::RedisListingCache;

// ============================================================================
// Listing Cache - ephemeral mirror of the full order listing
// ============================================================================
//
// The cache is never authoritative. Every error it produces is recovered by
// the caller as a miss; no cache failure may fail an operation.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ListingCache: Send + Sync {
    /// Fetch the value under `key`, absent on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` for `ttl_seconds`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64)
        -> Result<(), CacheError>;

    /// Drop `key` entirely. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), CacheError>;
}
