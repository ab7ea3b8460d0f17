//! Category routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shophouse_core::CategoryId;

use super::{CountResponse, map_conflict, parse_id};
use crate::db::categories::{CategoryFields, CategoryRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Category;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/get/count", get(count))
        .route("/{id}", get(get_one).put(update).delete(remove))
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.as_i32(),
            name: category.name,
            icon: category.icon,
            color: category.color,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategoryPayload {
    name: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    color: String,
}

impl From<CategoryPayload> for CategoryFields {
    fn from(payload: CategoryPayload) -> Self {
        Self {
            name: payload.name,
            icon: payload.icon,
            color: payload.color,
        }
    }
}

async fn list(State(state): State<AppState>, _auth: RequireAuth) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>> {
    let id: CategoryId = parse_id(&id)?;

    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category with the given ID".to_string()))?;

    Ok(Json(category.into()))
}

async fn count(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let count = CategoryRepository::new(state.pool()).count().await?;
    Ok(Json(CountResponse { count }))
}

async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let fields: CategoryFields = payload.into();
    let name = fields.name.clone();

    let category = CategoryRepository::new(state.pool())
        .create(&fields)
        .await
        .map_err(|e| map_conflict(e, &name))?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<CategoryResponse>> {
    let id: CategoryId = parse_id(&id)?;
    let fields: CategoryFields = payload.into();
    let name = fields.name.clone();

    let category = CategoryRepository::new(state.pool())
        .update(id, &fields)
        .await
        .map_err(|e| map_conflict(e, &name))?
        .ok_or_else(|| AppError::NotFound("Category with the given ID".to_string()))?;

    Ok(Json(category.into()))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: CategoryId = parse_id(&id)?;

    if CategoryRepository::new(state.pool()).delete(id).await? {
        Ok(Json(json!({ "success": true, "message": "Category deleted" })))
    } else {
        Err(AppError::NotFound("Category with the given ID".to_string()))
    }
}
