//! Order repository.
//!
//! Order creation writes the order row and all of its line items inside a
//! single transaction, so a mid-sequence failure can never orphan items.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use shophouse_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::{Order, OrderDetail, OrderItemDetail, OrderSummary};

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    shipping_address1: String,
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
    total_price: Decimal,
    user_id: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            shipping_address1: row.shipping_address1,
            shipping_address2: row.shipping_address2,
            city: row.city,
            zip: row.zip,
            country: row.country,
            phone: row.phone,
            status,
            total_price: row.total_price,
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        })
    }
}

/// Internal row type for the admin listing (order + owning user's name).
#[derive(Debug, sqlx::FromRow)]
struct OrderWithUserRow {
    #[sqlx(flatten)]
    order: OrderRow,
    user_name: String,
}

/// Internal row type for line items with product and category resolved.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    item_id: i32,
    order_id: i32,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

/// A requested line item: product reference plus quantity.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Field bundle for persisting a new order.
///
/// `total_price` has already been computed server-side from current product
/// prices; the owning user comes from the authenticated request, never from
/// the payload.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub items: Vec<NewOrderItem>,
}

/// Mutable order fields for the admin update route. Line items are
/// immutable after creation and cannot be changed here.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: OrderStatus,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order and its line items in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert or the commit
    /// fails; nothing is persisted in that case.
    pub async fn create(
        &self,
        user_id: UserId,
        new_order: &NewOrder,
    ) -> Result<OrderSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (order_id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO shop_order (shipping_address1, shipping_address2, city, zip,
                                    country, phone, status, total_price, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            ",
        )
        .bind(&new_order.shipping_address1)
        .bind(&new_order.shipping_address2)
        .bind(&new_order.city)
        .bind(&new_order.zip)
        .bind(&new_order.country)
        .bind(&new_order.phone)
        .bind(new_order.status.as_str())
        .bind(new_order.total_price)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut item_ids = Vec::with_capacity(new_order.items.len());
        for item in &new_order.items {
            let (item_id,): (i32,) = sqlx::query_as(
                r"
                INSERT INTO order_item (order_id, product_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;

            item_ids.push(OrderItemId::new(item_id));
        }

        tx.commit().await?;

        Ok(OrderSummary {
            order: Order {
                id: OrderId::new(order_id),
                shipping_address1: new_order.shipping_address1.clone(),
                shipping_address2: new_order.shipping_address2.clone(),
                city: new_order.city.clone(),
                zip: new_order.zip.clone(),
                country: new_order.country.clone(),
                phone: new_order.phone.clone(),
                status: new_order.status,
                total_price: new_order.total_price,
                user_id,
                created_at,
            },
            item_ids,
        })
    }

    /// List all orders with user name and nested item -> product -> category
    /// resolved, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_all_detailed(&self) -> Result<Vec<OrderDetail>, RepositoryError> {
        let order_rows = sqlx::query_as::<_, OrderWithUserRow>(
            r"
            SELECT o.id, o.shipping_address1, o.shipping_address2, o.city, o.zip,
                   o.country, o.phone, o.status, o.total_price, o.user_id,
                   o.created_at, u.name AS user_name
            FROM shop_order o
            JOIN shop_user u ON u.id = o.user_id
            ORDER BY o.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<i32> = order_rows.iter().map(|r| r.order.id).collect();
        let mut items_by_order = self.items_for_orders(&order_ids).await?;

        let mut details = Vec::with_capacity(order_rows.len());
        for row in order_rows {
            let order_id = row.order.id;
            let order: Order = row.order.try_into()?;
            details.push(OrderDetail {
                order,
                user_name: row.user_name,
                items: items_by_order.remove(&order_id).unwrap_or_default(),
            });
        }

        Ok(details)
    }

    /// Get one order with user name and items resolved. Returns `None` if
    /// the id does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_detailed(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderWithUserRow>(
            r"
            SELECT o.id, o.shipping_address1, o.shipping_address2, o.city, o.zip,
                   o.country, o.phone, o.status, o.total_price, o.user_id,
                   o.created_at, u.name AS user_name
            FROM shop_order o
            JOIN shop_user u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order_id = row.order.id;
        let mut items_by_order = self.items_for_orders(&[order_id]).await?;

        Ok(Some(OrderDetail {
            order: row.order.try_into()?,
            user_name: row.user_name,
            items: items_by_order.remove(&order_id).unwrap_or_default(),
        }))
    }

    /// List orders owned by one user, newest first, each with its line
    /// item ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, shipping_address1, shipping_address2, city, zip, country,
                   phone, status, total_price, user_id, created_at
            FROM shop_order
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut item_ids_by_order = self.item_ids_for_orders(&order_ids).await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = row.id;
            summaries.push(OrderSummary {
                order: row.try_into()?,
                item_ids: item_ids_by_order.remove(&order_id).unwrap_or_default(),
            });
        }

        Ok(summaries)
    }

    /// Update an order's shipping fields and status. Returns `None` if the
    /// id does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn update(
        &self,
        id: OrderId,
        fields: &OrderUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE shop_order
            SET shipping_address1 = $2, shipping_address2 = $3, city = $4,
                zip = $5, country = $6, phone = $7, status = $8
            WHERE id = $1
            RETURNING id, shipping_address1, shipping_address2, city, zip,
                      country, phone, status, total_price, user_id, created_at
            ",
        )
        .bind(id)
        .bind(&fields.shipping_address1)
        .bind(&fields.shipping_address2)
        .bind(&fields.city)
        .bind(&fields.zip)
        .bind(&fields.country)
        .bind(&fields.phone)
        .bind(fields.status.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete an order (line items cascade).
    ///
    /// # Returns
    ///
    /// `true` if the order was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shop_order")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Sum of `total_price` across all orders. An empty order set sums to
    /// zero rather than failing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the aggregation fails.
    pub async fn total_sales(&self) -> Result<Decimal, RepositoryError> {
        let (total,): (Decimal,) =
            sqlx::query_as("SELECT COALESCE(SUM(total_price), 0) FROM shop_order")
                .fetch_one(self.pool)
                .await?;

        Ok(total)
    }

    /// Fetch line item ids for a set of orders, grouped by order id.
    async fn item_ids_for_orders(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItemId>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT id, order_id FROM order_item WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(order_ids.to_vec())
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderItemId>> = HashMap::new();
        for (item_id, order_id) in rows {
            by_order
                .entry(order_id)
                .or_default()
                .push(OrderItemId::new(item_id));
        }

        Ok(by_order)
    }

    /// Fetch resolved line items for a set of orders, grouped by order id.
    async fn items_for_orders(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItemDetail>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id AS item_id, oi.order_id, oi.quantity,
                   p.id, p.name, p.short_description, p.long_description,
                   p.image, p.gallery, p.brand, p.price, p.count_in_stock,
                   p.rating, p.num_reviews, p.is_featured, p.created_at,
                   c.id AS category_id, c.name AS category_name,
                   c.icon AS category_icon, c.color AS category_color
            FROM order_item oi
            JOIN product p ON p.id = oi.product_id
            JOIN category c ON c.id = p.category_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(order_ids.to_vec())
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderItemDetail>> = HashMap::new();
        for row in rows {
            let detail = OrderItemDetail {
                id: OrderItemId::new(row.item_id),
                quantity: row.quantity,
                product: row.product.try_into()?,
            };
            by_order.entry(row.order_id).or_default().push(detail);
        }

        Ok(by_order)
    }
}
