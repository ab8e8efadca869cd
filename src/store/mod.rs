mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::order::{NewOrder, OrderRecord, OrderStatus};

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

// ============================================================================
// Order Store - durable order storage
// ============================================================================
//
// The store is the sole source of truth. Everything above it treats a store
// failure as fatal for the operation in flight; nothing here is ever
// silently recovered.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order with status pending and return its assigned id.
    async fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError>;

    /// All rows, newest first by creation time.
    async fn fetch_all(&self) -> Result<Vec<OrderRecord>, StoreError>;

    /// Up to `limit` order ids currently in `status`, in the store's
    /// natural order.
    async fn fetch_ids_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<i64>, StoreError>;

    /// Unconditional status write. Returns the number of rows touched; a
    /// missing id is zero rows, not an error.
    async fn set_status(&self, id: i64, status: OrderStatus) -> Result<u64, StoreError>;

    /// Compare-and-set status transition: the write applies only while the
    /// row is still in `from`. Returns whether it applied.
    async fn advance_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
