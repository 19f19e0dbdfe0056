//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomline_core::{OrderId, OrderStatus, ProductId, UserId};

/// Shipping destination for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub phone_no: String,
}

/// Gateway payment reference attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
}

/// One line of an order: a product reference plus quantity, with the name
/// and unit price snapshotted at order time. Stock stays authoritative on
/// the product itself.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_info: ShippingInfo,
    pub payment_info: PaymentInfo,
    pub items: Vec<OrderItem>,
    /// Sum of item price x quantity, computed server-side at creation.
    pub items_subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: i32,
}

/// Input for creating an order.
///
/// Totals are not part of the input: the repository computes the subtotal
/// from current product prices and derives the grand total.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub shipping_info: ShippingInfo,
    pub payment_info: PaymentInfo,
    pub items: Vec<OrderLine>,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
}
