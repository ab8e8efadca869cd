use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{OrderStore, StoreError};
use crate::config::DatabaseConfig;
use crate::domain::order::{NewOrder, OrderRecord, OrderStatus};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Statements stay single and atomic; there is no multi-statement transaction
// anywhere. The engine's idempotent transitions lean on that: a
// compare-and-set UPDATE either applies in full or touches nothing.
//
// ============================================================================

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS orders (
    id            BIGSERIAL PRIMARY KEY,
    customer_name TEXT NOT NULL,
    items         JSONB NOT NULL,
    total         NUMERIC(10,2) NOT NULL,
    status        TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
)";

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Connect a bounded pool to the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.url())
            .await?;
        Ok(Self { pool })
    }

    /// Create the orders table if it does not exist yet. Safe to run from
    /// every process at startup.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("Orders schema ready");
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO orders (customer_name, items, total, status) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&order.customer_name)
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch_all(&self) -> Result<Vec<OrderRecord>, StoreError> {
        let records = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, customer_name, items, total, status, created_at \
             FROM orders ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn fetch_ids_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM orders WHERE status = $1 LIMIT $2")
            .bind(status.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn set_status(&self, id: i64, status: OrderStatus) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn advance_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
