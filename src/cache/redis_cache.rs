use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{CacheError, ListingCache};
use crate::config::CacheConfig;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// ============================================================================
// Redis Listing Cache
// ============================================================================
//
// Connections are scoped per operation; nothing holds a Redis connection
// across calls. A circuit breaker sits in front of the dial so a dead cache
// costs one refused check instead of a connect timeout per request.
//
// ============================================================================

pub struct RedisListingCache {
    client: redis::Client,
    breaker: CircuitBreaker,
}

impl RedisListingCache {
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url())?;
        Ok(Self {
            client,
            breaker: CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: 5,
                cooldown: Duration::from_secs(30),
            }),
        })
    }

    pub async fn breaker_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if !self.breaker.allow().await {
            return Err(CacheError::Unavailable("circuit breaker open".to_string()));
        }
        match self.client.get_multiplexed_async_connection().await {
            Ok(connection) => Ok(connection),
            Err(error) => {
                self.breaker.record_failure().await;
                Err(CacheError::Redis(error))
            }
        }
    }

    async fn track<T>(&self, result: redis::RedisResult<T>) -> Result<T, CacheError> {
        match result {
            Ok(value) => {
                self.breaker.record_success().await;
                Ok(value)
            }
            Err(error) => {
                self.breaker.record_failure().await;
                Err(CacheError::Redis(error))
            }
        }
    }
}

#[async_trait]
impl ListingCache for RedisListingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection().await?;
        let value: Option<String> = self.track(connection.get(key).await).await?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let _: () = self
            .track(connection.set_ex(key, value, ttl_seconds).await)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let _: i64 = self.track(connection.del(key).await).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let _: String = self
            .track(redis::cmd("PING").query_async(&mut connection).await)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> CacheConfig {
        CacheConfig {
            host: "127.0.0.1".to_string(),
            // Reserved port nothing listens on
            port: 1,
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_cache_reports_error() {
        let cache = RedisListingCache::new(&unreachable_config()).unwrap();
        assert!(cache.get("all_orders").await.is_err());
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_breaker_opens_after_repeated_failures() {
        let cache = RedisListingCache::new(&unreachable_config()).unwrap();

        for _ in 0..5 {
            let _ = cache.ping().await;
        }
        assert_eq!(cache.breaker_state().await, CircuitState::Open);

        // Refused without dialing
        let error = cache.get("all_orders").await.unwrap_err();
        assert!(matches!(error, CacheError::Unavailable(_)));
    }
}
