//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use shophouse_core::{CategoryId, Price, ProductId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{Category, Product, ProductWithCategory};

/// Columns selected by every product query, category joined in.
const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.short_description, p.long_description, p.image,
           p.gallery, p.brand, p.price, p.count_in_stock, p.rating,
           p.num_reviews, p.is_featured, p.created_at,
           c.id AS category_id, c.name AS category_name,
           c.icon AS category_icon, c.color AS category_color
    FROM product p
    JOIN category c ON c.id = p.category_id
";

/// Internal row type for product queries with the category resolved.
///
/// Shared with the order repository, which joins the same columns when
/// resolving line items.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: i32,
    name: String,
    short_description: String,
    long_description: String,
    image: String,
    gallery: Vec<String>,
    brand: String,
    price: Decimal,
    count_in_stock: i32,
    rating: Decimal,
    num_reviews: i32,
    is_featured: bool,
    created_at: DateTime<Utc>,
    category_id: i32,
    category_name: String,
    category_icon: String,
    category_color: String,
}

impl TryFrom<ProductRow> for ProductWithCategory {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            product: Product {
                id: ProductId::new(row.id),
                name: row.name,
                short_description: row.short_description,
                long_description: row.long_description,
                image: row.image,
                gallery: row.gallery,
                brand: row.brand,
                price,
                category_id: CategoryId::new(row.category_id),
                count_in_stock: row.count_in_stock,
                rating: row.rating,
                num_reviews: row.num_reviews,
                is_featured: row.is_featured,
                created_at: row.created_at,
            },
            category: Category {
                id: CategoryId::new(row.category_id),
                name: row.category_name,
                icon: row.category_icon,
                color: row.category_color,
            },
        })
    }
}

/// Field bundle for creating or updating a product.
///
/// The category reference is validated by the caller before persisting
/// (`InvalidCategory` is a handler-level failure, not a repository one).
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub image: String,
    pub brand: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub count_in_stock: i32,
    pub rating: Decimal,
    pub num_reviews: i32,
    pub is_featured: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, optionally filtered by category ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list(
        &self,
        categories: Option<&[CategoryId]>,
    ) -> Result<Vec<ProductWithCategory>, RepositoryError> {
        let rows = match categories {
            Some(ids) => {
                let ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
                sqlx::query_as::<_, ProductRow>(&format!(
                    "{PRODUCT_SELECT} WHERE p.category_id = ANY($1) ORDER BY p.name"
                ))
                .bind(ids)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} ORDER BY p.name"))
                    .fetch_all(self.pool)
                    .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by id with its category resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get just a product's current price, for order total computation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_price(&self, id: ProductId) -> Result<Option<Price>, RepositoryError> {
        let row: Option<(Decimal,)> = sqlx::query_as("SELECT price FROM product WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(|(amount,)| {
            Price::new(amount).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
            })
        })
        .transpose()
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        fields: &ProductFields,
    ) -> Result<ProductWithCategory, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO product (name, short_description, long_description, image,
                                 brand, price, category_id, count_in_stock,
                                 rating, num_reviews, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(&fields.name)
        .bind(&fields.short_description)
        .bind(&fields.long_description)
        .bind(&fields.image)
        .bind(&fields.brand)
        .bind(fields.price)
        .bind(fields.category_id)
        .bind(fields.count_in_stock)
        .bind(fields.rating)
        .bind(fields.num_reviews)
        .bind(fields.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &fields.name))?;

        self.get(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update a product. Returns `None` if the id does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new name collides.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            UPDATE product
            SET name = $2, short_description = $3, long_description = $4,
                image = $5, brand = $6, price = $7, category_id = $8,
                count_in_stock = $9, rating = $10, num_reviews = $11,
                is_featured = $12
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.short_description)
        .bind(&fields.long_description)
        .bind(&fields.image)
        .bind(&fields.brand)
        .bind(fields.price)
        .bind(fields.category_id)
        .bind(fields.count_in_stock)
        .bind(fields.rating)
        .bind(fields.num_reviews)
        .bind(fields.is_featured)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &fields.name))?;

        match row {
            Some(_) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// Replace a product's gallery image list. Returns `None` if the id
    /// does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_gallery(
        &self,
        id: ProductId,
        gallery: &[String],
    ) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let row: Option<(i32,)> =
            sqlx::query_as("UPDATE product SET gallery = $2 WHERE id = $1 RETURNING id")
                .bind(id)
                .bind(gallery)
                .fetch_optional(self.pool)
                .await?;

        match row {
            Some(_) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// List featured products, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn featured(&self, limit: i64) -> Result<Vec<ProductWithCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.is_featured ORDER BY p.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
