//! Order workflow.
//!
//! The order total is always computed server-side from the current product
//! prices. Price lookups for the requested items fan out concurrently; the
//! order row and its line items are then persisted in a single transaction.

use futures::future::try_join_all;
use rust_decimal::Decimal;
use sqlx::PgPool;

use shophouse_core::{OrderId, Price, UserId};

use crate::db::orders::{NewOrder, NewOrderItem, OrderRepository, OrderUpdate};
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::{Order, OrderDetail, OrderSummary};

/// A requested order before pricing: shipping details plus the items the
/// client wants. No total; that is never accepted from the client.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub items: Vec<NewOrderItem>,
}

/// Order workflow service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Price and persist an order for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the draft has no items or a
    /// non-positive quantity. Returns `AppError::OrderCreationFailed` if a
    /// referenced product does not exist or the persist step fails.
    pub async fn create(&self, user_id: UserId, draft: OrderDraft) -> Result<OrderSummary> {
        if draft.items.is_empty() {
            return Err(AppError::BadRequest(
                "Order must contain at least one item".to_string(),
            ));
        }

        let line_totals = try_join_all(
            draft
                .items
                .iter()
                .map(|item| self.line_total(item.product_id, item.quantity)),
        )
        .await?;

        let total_price: Decimal = line_totals.into_iter().sum();

        let new_order = NewOrder {
            shipping_address1: draft.shipping_address1,
            shipping_address2: draft.shipping_address2,
            city: draft.city,
            zip: draft.zip,
            country: draft.country,
            phone: draft.phone,
            status: shophouse_core::OrderStatus::default(),
            total_price,
            items: draft.items,
        };

        self.orders
            .create(user_id, &new_order)
            .await
            .map_err(|_| AppError::OrderCreationFailed)
    }

    /// List all orders with user and items resolved, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderDetail>> {
        Ok(self.orders.list_all_detailed().await?)
    }

    /// Get one order with its items resolved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id does not resolve.
    pub async fn get(&self, id: OrderId) -> Result<OrderDetail> {
        self.orders
            .get_detailed(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order with the given ID".to_string()))
    }

    /// List orders owned by one user, newest first, each carrying its line
    /// item ids.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Update an order's shipping fields and status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id does not resolve.
    pub async fn update(&self, id: OrderId, fields: &OrderUpdate) -> Result<Order> {
        self.orders
            .update(id, fields)
            .await?
            .ok_or_else(|| AppError::NotFound("Order with the given ID".to_string()))
    }

    /// Delete an order and its line items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id does not resolve.
    pub async fn delete(&self, id: OrderId) -> Result<()> {
        if self.orders.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Order with the given ID".to_string()))
        }
    }

    /// Count orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64> {
        Ok(self.orders.count().await?)
    }

    /// Sum of `total_price` across all orders; zero when there are none.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Aggregation` if the aggregation fails.
    pub async fn total_sales(&self) -> Result<Decimal> {
        self.orders
            .total_sales()
            .await
            .map_err(|e| AppError::Aggregation(e.to_string()))
    }

    /// Current-price line total for one requested item.
    async fn line_total(
        &self,
        product_id: shophouse_core::ProductId,
        quantity: i32,
    ) -> Result<Decimal> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                AppError::BadRequest("Item quantity must be a positive integer".to_string())
            })?;

        let price: Price = self
            .products
            .get_price(product_id)
            .await?
            .ok_or(AppError::OrderCreationFailed)?;

        Ok(price.line_total(quantity))
    }
}
