//! Order and order item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shophouse_core::{OrderId, OrderItemId, OrderStatus, UserId};

use super::ProductWithCategory;

/// A persisted order.
///
/// `total_price` is always server-computed at creation time; it never comes
/// from the client.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// An order with its line item ids, as returned from creation.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub item_ids: Vec<OrderItemId>,
}

/// An order item with its product and category resolved (read-side join).
#[derive(Debug, Clone)]
pub struct OrderItemDetail {
    pub id: OrderItemId,
    pub quantity: i32,
    pub product: ProductWithCategory,
}

/// An order with user name and nested item -> product -> category resolved.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub user_name: String,
    pub items: Vec<OrderItemDetail>,
}
