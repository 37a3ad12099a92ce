//! Order repository.
//!
//! Orders are created by the storefront checkout; the console reads them
//! and moves their status along.

use serde_json::json;

use guacamaya_core::{OrderId, OrderStatus};

use super::{StoreClient, StoreError};
use crate::models::{Order, OrderItem};

const TABLE: &str = "orders";
const ITEMS_TABLE: &str = "order_items";

/// Repository for order row operations.
pub struct OrderRepository {
    store: StoreClient,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub fn new(store: &StoreClient) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// List all orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn list(&self) -> Result<Vec<Order>, StoreError> {
        self.store
            .query(TABLE)
            .order_desc("created_at")
            .fetch()
            .await
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        self.store
            .query(TABLE)
            .eq("id", id)
            .fetch_optional()
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the update fails.
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        self.store
            .update(TABLE, json!({ "status": status }))
            .eq("id", id)
            .execute()
            .await
    }

    /// List the line items of an order.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        self.store
            .query(ITEMS_TABLE)
            .eq("order_id", order_id)
            .fetch()
            .await
    }
}
