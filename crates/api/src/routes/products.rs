//! Product routes.
//!
//! Product creation is a multipart request carrying the main image file;
//! the gallery endpoint accepts up to ten more. Stored images are served
//! back under `/public/uploads`.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shophouse_core::{CategoryId, Price, ProductId};

use super::categories::CategoryResponse;
use super::{CountResponse, map_conflict, parse_id};
use crate::db::categories::CategoryRepository;
use crate::db::products::{ProductFields, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ProductWithCategory;
use crate::services::uploads::MAX_GALLERY_IMAGES;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/get/count", get(count))
        .route("/get/featured/{count}", get(featured))
        .route("/gallery-images/{id}", put(upload_gallery))
        .route("/{id}", get(get_one).put(update).delete(remove))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub image: String,
    pub images: Vec<String>,
    pub brand: String,
    pub price: Price,
    pub category: CategoryResponse,
    pub count_in_stock: i32,
    pub rating: Decimal,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub date_created: DateTime<Utc>,
}

impl From<ProductWithCategory> for ProductResponse {
    fn from(full: ProductWithCategory) -> Self {
        let product = full.product;
        Self {
            id: product.id.as_i32(),
            name: product.name,
            description: product.short_description,
            rich_description: product.long_description,
            image: product.image,
            images: product.gallery,
            brand: product.brand,
            price: product.price,
            category: full.category.into(),
            count_in_stock: product.count_in_stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            is_featured: product.is_featured,
            date_created: product.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    categories: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let filter = query
        .categories
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.split(',')
                .map(|part| parse_id::<CategoryId>(part.trim()))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let products = ProductRepository::new(state.pool())
        .list(filter.as_deref())
        .await?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = parse_id(&id)?;

    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product with the given ID".to_string()))?;

    Ok(Json(product.into()))
}

async fn count(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<CountResponse>> {
    let count = ProductRepository::new(state.pool()).count().await?;
    Ok(Json(CountResponse { count }))
}

async fn featured(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> Result<Json<Vec<ProductResponse>>> {
    // Parsed as unsigned so a negative count is a 400, not a bad LIMIT.
    let limit: u32 = count
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid featured count: {count}")))?;

    let products = ProductRepository::new(state.pool())
        .featured(i64::from(limit))
        .await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let form = ProductForm::read(multipart).await?;

    let category_id = CategoryId::new(form.required_i32("category")?);
    ensure_category(&state, category_id).await?;

    let (file_name, content_type, bytes) = form.image.as_ref().ok_or(AppError::MissingImage)?;
    let image = state.images().store(file_name, content_type, bytes).await?;

    let fields = ProductFields {
        name: form.required("name")?,
        short_description: form.optional("description"),
        long_description: form.optional("richDescription"),
        image,
        brand: form.optional("brand"),
        price: Price::parse(&form.required("price")?)
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        category_id,
        count_in_stock: form.required_i32("countInStock")?,
        rating: form.optional_decimal("rating")?,
        num_reviews: form.optional_i32("numReviews")?,
        is_featured: form.parsed_or("isFeatured", false)?,
    };

    let product = ProductRepository::new(state.pool())
        .create(&fields)
        .await
        .map_err(|e| map_conflict(e, &fields.name))?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Update a product. Multipart like creation, but every field falls back
/// to the stored value, including the image when no new file is attached.
async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = parse_id(&id)?;
    let form = ProductForm::read(multipart).await?;

    let repo = ProductRepository::new(state.pool());
    let current = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product with the given ID".to_string()))?
        .product;

    let category_id = match form.text.get("category") {
        Some(raw) => CategoryId::new(raw.parse().map_err(|_| AppError::InvalidCategory)?),
        None => current.category_id,
    };
    ensure_category(&state, category_id).await?;

    let image = match form.image.as_ref() {
        Some((file_name, content_type, bytes)) => {
            state.images().store(file_name, content_type, bytes).await?
        }
        None => current.image,
    };

    let price = match form.text.get("price") {
        Some(raw) => Price::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => current.price,
    };

    let fields = ProductFields {
        name: form.text_or("name", current.name),
        short_description: form.text_or("description", current.short_description),
        long_description: form.text_or("richDescription", current.long_description),
        image,
        brand: form.text_or("brand", current.brand),
        price,
        category_id,
        count_in_stock: form.parsed_or("countInStock", current.count_in_stock)?,
        rating: form.parsed_or("rating", current.rating)?,
        num_reviews: form.parsed_or("numReviews", current.num_reviews)?,
        is_featured: form.parsed_or("isFeatured", current.is_featured)?,
    };

    let product = repo
        .update(id, &fields)
        .await
        .map_err(|e| map_conflict(e, &fields.name))?
        .ok_or_else(|| AppError::NotFound("Product with the given ID".to_string()))?;

    Ok(Json(product.into()))
}

async fn upload_gallery(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = parse_id(&id)?;

    let mut urls = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("images") {
            continue;
        }
        if urls.len() >= MAX_GALLERY_IMAGES {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_GALLERY_IMAGES} gallery images are allowed"
            )));
        }

        let file_name = field.file_name().unwrap_or("image").to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        urls.push(state.images().store(&file_name, &content_type, &bytes).await?);
    }

    let product = ProductRepository::new(state.pool())
        .set_gallery(id, &urls)
        .await?
        .ok_or_else(|| AppError::NotFound("Product with the given ID".to_string()))?;

    Ok(Json(product.into()))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: ProductId = parse_id(&id)?;

    if ProductRepository::new(state.pool()).delete(id).await? {
        Ok(Json(json!({ "success": true, "message": "Product deleted" })))
    } else {
        Err(AppError::NotFound("Product with the given ID".to_string()))
    }
}

async fn ensure_category(state: &AppState, id: CategoryId) -> Result<()> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(|_| ())
        .ok_or(AppError::InvalidCategory)
}

/// Collected fields of the product-creation multipart form.
struct ProductForm {
    text: HashMap<String, String>,
    image: Option<(String, String, Vec<u8>)>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut text = HashMap::new();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(ToOwned::to_owned) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().unwrap_or("image").to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                image = Some((file_name, content_type, bytes.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                text.insert(name, value);
            }
        }

        Ok(Self { text, image })
    }

    fn text_or(&self, key: &str, fallback: String) -> String {
        self.text.get(key).cloned().unwrap_or(fallback)
    }

    fn parsed_or<T: std::str::FromStr>(&self, key: &str, fallback: T) -> Result<T> {
        match self.text.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid value for field: {key}"))),
            None => Ok(fallback),
        }
    }

    fn required(&self, key: &str) -> Result<String> {
        self.text
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("Missing field: {key}")))
    }

    fn optional(&self, key: &str) -> String {
        self.text.get(key).cloned().unwrap_or_default()
    }

    fn required_i32(&self, key: &str) -> Result<i32> {
        self.required(key)?
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid value for field: {key}")))
    }

    fn optional_i32(&self, key: &str) -> Result<i32> {
        match self.text.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid value for field: {key}"))),
            None => Ok(0),
        }
    }

    fn optional_decimal(&self, key: &str) -> Result<Decimal> {
        match self.text.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid value for field: {key}"))),
            None => Ok(Decimal::ZERO),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form_with(entries: &[(&str, &str)]) -> ProductForm {
        ProductForm {
            text: entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            image: None,
        }
    }

    #[test]
    fn test_is_featured_flag_parsing() {
        let form = form_with(&[("isFeatured", "true")]);
        assert!(form.parsed_or("isFeatured", false).unwrap());

        let form = form_with(&[("isFeatured", "false")]);
        assert!(!form.parsed_or("isFeatured", true).unwrap());

        let form = form_with(&[]);
        assert!(!form.parsed_or("isFeatured", false).unwrap());
    }

    #[test]
    fn test_is_featured_garbage_rejected() {
        let form = form_with(&[("isFeatured", "yes")]);
        assert!(matches!(
            form.parsed_or::<bool>("isFeatured", false),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_missing_numeric_fields_default() {
        let form = form_with(&[]);
        assert_eq!(form.optional_i32("numReviews").unwrap(), 0);
        assert_eq!(form.optional_decimal("rating").unwrap(), Decimal::ZERO);
    }
}
