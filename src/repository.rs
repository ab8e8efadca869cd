use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::ListingCache;
use crate::config::CacheConfig;
use crate::domain::order::{NewOrder, Order, OrderStatus, ValidationError};
use crate::metrics::Metrics;
use crate::store::{OrderStore, StoreError};

// ============================================================================
// Order Repository - read-through cache over the order store
// ============================================================================
//
// Single entry point for all order reads and writes:
// - Listings are served from the cache when a fresh entry exists, otherwise
//   from the store, with the result written back under a TTL.
// - Every write (create, status update, engine transition) deletes the cached
//   listing rather than patching it. The next read rebuilds it.
// - Cache failures are never surfaced to callers. A broken cache degrades
//   every lookup to a database read and nothing else.
// ============================================================================

/// Errors surfaced to callers of the repository.
///
/// Cache errors never appear here. They are logged and absorbed at the point
/// of failure.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a listing was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    Cache,
    Database,
}

/// A full order listing plus provenance, newest orders first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderListing {
    pub source: ListingSource,
    pub data: Vec<Order>,
    pub count: usize,
}

pub struct OrderRepository {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn ListingCache>,
    listing_key: String,
    listing_ttl_seconds: u64,
    metrics: Arc<Metrics>,
}

impl OrderRepository {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: Arc<dyn ListingCache>,
        config: &CacheConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            cache,
            listing_key: config.listing_key.clone(),
            listing_ttl_seconds: config.ttl_seconds,
            metrics,
        }
    }

    /// List all orders, newest first.
    ///
    /// Tries the cache before the store. A cache entry that cannot be fetched
    /// or decoded counts as a miss and the listing is rebuilt from the store.
    pub async fn list_orders(&self) -> Result<OrderListing, RepositoryError> {
        match self.cache.get(&self.listing_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Order>>(&raw) {
                Ok(data) => {
                    self.metrics.record_cache_hit();
                    tracing::info!(count = data.len(), "Returning orders from cache");
                    return Ok(OrderListing {
                        source: ListingSource::Cache,
                        count: data.len(),
                        data,
                    });
                }
                Err(e) => {
                    self.metrics.record_cache_error();
                    tracing::warn!(error = %e, "Discarding undecodable cached listing");
                }
            },
            Ok(None) => {
                self.metrics.record_cache_miss();
            }
            Err(e) => {
                self.metrics.record_cache_error();
                tracing::warn!(error = %e, "Cache lookup failed, falling back to database");
            }
        }

        let records = self.store.fetch_all().await?;
        let mut data = Vec::with_capacity(records.len());
        for record in records {
            let order_id = record.id;
            match Order::from_record(record) {
                Ok(order) => data.push(order),
                Err(e) => {
                    tracing::warn!(order_id, error = %e, "Dropping order with malformed row");
                }
            }
        }

        match serde_json::to_string(&data) {
            Ok(serialized) => {
                if let Err(e) = self
                    .cache
                    .set_with_ttl(&self.listing_key, &serialized, self.listing_ttl_seconds)
                    .await
                {
                    tracing::warn!(error = %e, "Failed to cache orders");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize orders for caching");
            }
        }

        tracing::info!(count = data.len(), "Returning orders from database");
        Ok(OrderListing {
            source: ListingSource::Database,
            count: data.len(),
            data,
        })
    }

    /// Validate and persist a new order, then drop the cached listing.
    pub async fn create_order(&self, order: &NewOrder) -> Result<i64, RepositoryError> {
        order.validate()?;

        let order_id = self.store.insert_order(order).await?;
        self.metrics.record_order_created();
        tracing::info!(order_id, customer_name = %order.customer_name, "Order created");

        self.invalidate_listing().await;
        Ok(order_id)
    }

    /// Apply a caller-supplied status to an order.
    ///
    /// The status is required and must name a known state. The write itself is
    /// unconditional: whatever status the row held before is overwritten.
    /// Updating a missing order is not an error, it just changes nothing.
    pub async fn update_status(
        &self,
        order_id: i64,
        status: Option<String>,
    ) -> Result<(), RepositoryError> {
        let status = status.ok_or(ValidationError::MissingStatus)?;
        let status: OrderStatus = status.parse().map_err(ValidationError::from)?;

        let rows = self.store.set_status(order_id, status).await?;
        if rows > 0 {
            self.metrics.record_transition(status);
            tracing::info!(order_id, status = %status, "Order status updated");
        } else {
            tracing::debug!(order_id, "Status update matched no order");
        }

        self.invalidate_listing().await;
        Ok(())
    }

    /// Ids of pending orders, oldest first, capped at `limit`.
    pub async fn pending_batch(&self, limit: i64) -> Result<Vec<i64>, RepositoryError> {
        Ok(self
            .store
            .fetch_ids_by_status(OrderStatus::Pending, limit)
            .await?)
    }

    /// Ids of orders stuck in preparing, oldest first, capped at `limit`.
    pub async fn preparing_batch(&self, limit: i64) -> Result<Vec<i64>, RepositoryError> {
        Ok(self
            .store
            .fetch_ids_by_status(OrderStatus::Preparing, limit)
            .await?)
    }

    /// Move an order from `from` to `to` only if it still holds `from`.
    ///
    /// Returns false when some other writer got there first. Losing the race
    /// is not an error.
    pub async fn advance_status(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let advanced = self.store.advance_status(order_id, from, to).await?;
        if advanced {
            self.metrics.record_transition(to);
        } else {
            tracing::debug!(order_id, from = %from, to = %to, "Order no longer in expected status");
        }
        Ok(advanced)
    }

    /// Drop the cached listing so the next read rebuilds it.
    ///
    /// Failure to invalidate is logged and swallowed. The entry still expires
    /// on its own once the TTL lapses.
    pub async fn invalidate_listing(&self) {
        match self.cache.delete(&self.listing_key).await {
            Ok(()) => self.metrics.record_invalidation(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to invalidate cache");
            }
        }
    }
}
