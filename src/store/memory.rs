use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{OrderStore, StoreError};
use crate::domain::order::{NewOrder, OrderRecord, OrderStatus};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Keeps rows in insertion order, which doubles as the store's natural order
// for status scans. Supports simulated outages so callers can exercise their
// store-failure paths.
//
// ============================================================================

pub struct MemoryOrderStore {
    rows: RwLock<Vec<OrderRecord>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
    /// Operations still allowed before simulated failure kicks in.
    /// Negative means no limit.
    remaining_ok: AtomicI64,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
            remaining_ok: AtomicI64::new(-1),
        }
    }

    /// Simulate a full outage: every operation fails until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Let the next `operations` calls succeed, then fail every call after.
    pub fn fail_after(&self, operations: i64) {
        self.remaining_ok.store(operations, Ordering::SeqCst);
    }

    /// Seed a raw row directly, bypassing intake. Lets tests plant rows the
    /// normal write path would never produce.
    pub async fn insert_record(&self, customer_name: &str, items: Value, status: &str) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.write().await.push(OrderRecord {
            id,
            customer_name: customer_name.to_string(),
            items,
            total: rust_decimal::Decimal::ZERO,
            status: status.to_string(),
            created_at: Some(Utc::now()),
        });
        id
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        let remaining = self.remaining_ok.load(Ordering::SeqCst);
        if remaining >= 0 {
            if remaining == 0 {
                return Err(StoreError::Unavailable("simulated outage".to_string()));
            }
            self.remaining_ok.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<i64, StoreError> {
        self.check_available()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.write().await.push(OrderRecord {
            id,
            customer_name: order.customer_name.clone(),
            items: Value::Array(order.items.clone()),
            total: order.total,
            status: OrderStatus::Pending.as_str().to_string(),
            created_at: Some(Utc::now()),
        });
        Ok(id)
    }

    async fn fetch_all(&self) -> Result<Vec<OrderRecord>, StoreError> {
        self.check_available()?;
        let mut records = self.rows.read().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn fetch_ids_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<i64>, StoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.status == status.as_str())
            .take(limit.max(0) as usize)
            .map(|row| row.id)
            .collect())
    }

    async fn set_status(&self, id: i64, status: OrderStatus) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.status = status.as_str().to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn advance_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|row| row.id == id && row.status == from.as_str())
        {
            Some(row) => {
                row.status = to.as_str().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn order(name: &str) -> NewOrder {
        NewOrder {
            customer_name: name.to_string(),
            items: vec![json!("Pizza")],
            total: "9.99".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids_and_pending_status() {
        let store = MemoryOrderStore::new();
        let first = store.insert_order(&order("Alice")).await.unwrap();
        let second = store.insert_order(&order("Bob")).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let rows = store.fetch_all().await.unwrap();
        assert!(rows.iter().all(|row| row.status == "pending"));
    }

    #[tokio::test]
    async fn test_fetch_all_returns_newest_first() {
        let store = MemoryOrderStore::new();
        store.insert_order(&order("Alice")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.insert_order(&order("Bob")).await.unwrap();

        let rows = store.fetch_all().await.unwrap();
        assert_eq!(rows[0].customer_name, "Bob");
        assert_eq!(rows[1].customer_name, "Alice");
    }

    #[tokio::test]
    async fn test_status_scan_respects_limit_and_order() {
        let store = MemoryOrderStore::new();
        for i in 0..4 {
            store.insert_order(&order(&format!("c{}", i))).await.unwrap();
        }

        let ids = store
            .fetch_ids_by_status(OrderStatus::Pending, 2)
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);

        let none = store
            .fetch_ids_by_status(OrderStatus::Completed, 5)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_set_status_is_unconditional() {
        let store = MemoryOrderStore::new();
        let id = store.insert_order(&order("Alice")).await.unwrap();

        // Even a backward write goes through at this layer
        assert_eq!(store.set_status(id, OrderStatus::Completed).await.unwrap(), 1);
        assert_eq!(store.set_status(id, OrderStatus::Pending).await.unwrap(), 1);
        assert_eq!(store.set_status(999, OrderStatus::Pending).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_advance_status_applies_only_from_expected_state() {
        let store = MemoryOrderStore::new();
        let id = store.insert_order(&order("Alice")).await.unwrap();

        assert!(store
            .advance_status(id, OrderStatus::Pending, OrderStatus::Preparing)
            .await
            .unwrap());
        // Second attempt loses: the row is no longer pending
        assert!(!store
            .advance_status(id, OrderStatus::Pending, OrderStatus::Preparing)
            .await
            .unwrap());
        assert!(store
            .advance_status(id, OrderStatus::Preparing, OrderStatus::Completed)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_simulated_outage_fails_every_operation() {
        let store = MemoryOrderStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.ping().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.fetch_all().await.is_err());
        assert!(store.insert_order(&order("Alice")).await.is_err());
    }

    #[tokio::test]
    async fn test_fail_after_budget() {
        let store = MemoryOrderStore::new();
        store.fail_after(2);

        assert!(store.ping().await.is_ok());
        assert!(store.ping().await.is_ok());
        assert!(store.ping().await.is_err());
        assert!(store.ping().await.is_err());
    }
}
