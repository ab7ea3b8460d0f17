//! Product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shophouse_core::{CategoryId, Price, ProductId};

use super::Category;

/// A catalog product.
///
/// `image` and `gallery` are public URL paths into the uploaded-file store,
/// not raw file system paths.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub image: String,
    pub gallery: Vec<String>,
    pub brand: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub count_in_stock: i32,
    pub rating: Decimal,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// A product with its category reference resolved.
#[derive(Debug, Clone)]
pub struct ProductWithCategory {
    pub product: Product,
    pub category: Category,
}
