use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{FormatError, ValidationError};
use super::value_objects::OrderStatus;

// ============================================================================
// Order Model
// ============================================================================
//
// `Order` is the shape callers see: listing payloads, cache entries, and the
// gateway all speak it. `OrderRecord` is the raw row as the store returns it,
// before the per-row mapping that listing applies. `NewOrder` is the intake
// request.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub items: Vec<Value>,
    pub total: Decimal,
    pub status: OrderStatus,
    /// RFC 3339 in serialized form, or null when the store has no timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// A raw `orders` row. `items` and `status` are still undecoded here; rows
/// that fail the mapping are dropped from listings one by one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: i64,
    pub customer_name: String,
    pub items: Value,
    pub total: Decimal,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Map a stored row into the order shape.
    ///
    /// `items` may arrive as a JSON array or as a JSON string holding encoded
    /// JSON (older rows were written as text); both decode to the same list.
    pub fn from_record(record: OrderRecord) -> Result<Self, FormatError> {
        let OrderRecord {
            id,
            customer_name,
            items,
            total,
            status,
            created_at,
        } = record;

        let items = match items {
            Value::Array(items) => items,
            Value::String(text) => match serde_json::from_str(&text)? {
                Value::Array(items) => items,
                _ => return Err(FormatError::ItemsNotAnArray),
            },
            _ => return Err(FormatError::ItemsNotAnArray),
        };

        let status = status.parse::<OrderStatus>()?;

        Ok(Self {
            id,
            customer_name,
            items,
            total,
            status,
            created_at,
        })
    }
}

/// An order as submitted by a client. `status` is never client-controlled;
/// intake always starts at pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<Value>,
    pub total: Decimal,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_name.trim().is_empty() {
            return Err(ValidationError::EmptyCustomerName);
        }
        if self.items.is_empty() {
            return Err(ValidationError::EmptyItems);
        }
        if self.total < Decimal::ZERO {
            return Err(ValidationError::NegativeTotal);
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
