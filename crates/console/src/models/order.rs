//! Order and order line-item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use guacamaya_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod};

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Short human-facing code the customer uses to track the order.
    pub tracking_code: String,
    /// Customer's full name.
    pub customer_name: String,
    /// Customer's email address.
    pub customer_email: String,
    /// Customer's phone number, if given.
    pub customer_phone: Option<String>,
    /// How the customer paid.
    pub payment_method: PaymentMethod,
    /// Object-storage path of the uploaded transfer proof, when present.
    /// Only ever exposed through a signed, time-limited URL.
    pub payment_proof_path: Option<String>,
    /// Order total.
    pub total_amount: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Free-form staff notes.
    pub notes: Option<String>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// A line item within an order.
///
/// Product fields are denormalized at purchase time so later catalog edits
/// do not rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique line-item ID.
    pub id: OrderItemId,
    /// Order this item belongs to.
    pub order_id: OrderId,
    /// Product name at purchase time.
    pub product_name: String,
    /// Product SKU at purchase time.
    pub product_sku: String,
    /// Unit price at purchase time.
    pub product_price: Decimal,
    /// Units ordered.
    pub quantity: u32,
    /// `product_price * quantity`.
    pub subtotal: Decimal,
}
