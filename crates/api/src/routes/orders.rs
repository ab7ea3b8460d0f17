//! Order routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shophouse_core::{OrderId, OrderStatus, ProductId};

use super::products::ProductResponse;
use super::{CountResponse, parse_id};
use crate::db::orders::{NewOrderItem, OrderUpdate};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{OrderDetail, OrderSummary};
use crate::services::orders::{OrderDraft, OrderService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/single-order", get(my_orders))
        .route("/get/totalsales", get(total_sales))
        .route("/get/count", get(count))
        .route("/{id}", get(get_one).put(update).delete(remove))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    id: i32,
    order_items: Vec<i32>,
    shipping_address1: String,
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
    total_price: Decimal,
    user: i32,
    date_ordered: DateTime<Utc>,
}

impl From<OrderSummary> for OrderResponse {
    fn from(summary: OrderSummary) -> Self {
        let order = summary.order;
        Self {
            id: order.id.as_i32(),
            order_items: summary.item_ids.iter().map(|id| id.as_i32()).collect(),
            shipping_address1: order.shipping_address1,
            shipping_address2: order.shipping_address2,
            city: order.city,
            zip: order.zip,
            country: order.country,
            phone: order.phone,
            status: order.status.as_str().to_owned(),
            total_price: order.total_price,
            user: order.user_id.as_i32(),
            date_ordered: order.created_at,
        }
    }
}

/// Order as listed for its owner; items appear as ids, not expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserOrderResponse {
    id: i32,
    order_items: Vec<i32>,
    shipping_address1: String,
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
    total_price: Decimal,
    date_ordered: DateTime<Utc>,
}

impl From<OrderSummary> for UserOrderResponse {
    fn from(summary: OrderSummary) -> Self {
        let order = summary.order;
        Self {
            id: order.id.as_i32(),
            order_items: summary.item_ids.iter().map(|id| id.as_i32()).collect(),
            shipping_address1: order.shipping_address1,
            shipping_address2: order.shipping_address2,
            city: order.city,
            zip: order.zip,
            country: order.country,
            phone: order.phone,
            status: order.status.as_str().to_owned(),
            total_price: order.total_price,
            date_ordered: order.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemResponse {
    id: i32,
    quantity: i32,
    product: ProductResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderUserResponse {
    id: i32,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetailResponse {
    id: i32,
    order_items: Vec<OrderItemResponse>,
    shipping_address1: String,
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
    total_price: Decimal,
    user: OrderUserResponse,
    date_ordered: DateTime<Utc>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(detail: OrderDetail) -> Self {
        let order = detail.order;
        Self {
            id: order.id.as_i32(),
            order_items: detail
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id.as_i32(),
                    quantity: item.quantity,
                    product: item.product.into(),
                })
                .collect(),
            shipping_address1: order.shipping_address1,
            shipping_address2: order.shipping_address2,
            city: order.city,
            zip: order.zip,
            country: order.country,
            phone: order.phone,
            status: order.status.as_str().to_owned(),
            total_price: order.total_price,
            user: OrderUserResponse {
                id: order.user_id.as_i32(),
                name: detail.user_name,
            },
            date_ordered: order.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateOrderItemRequest {
    product: i32,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    order_items: Vec<CreateOrderItemRequest>,
    shipping_address1: String,
    #[serde(default)]
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderRequest {
    shipping_address1: String,
    #[serde(default)]
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
}

async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<OrderDetailResponse>>> {
    let orders = OrderService::new(state.pool()).list_all().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

async fn get_one(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<OrderDetailResponse>> {
    let id: OrderId = parse_id(&id)?;
    let order = OrderService::new(state.pool()).get(id).await?;

    // Owners see their own orders; anyone else's require admin.
    if order.order.user_id != auth.user_id && !auth.user.is_admin {
        return Err(crate::services::auth::AuthError::Forbidden.into());
    }

    Ok(Json(order.into()))
}

async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let draft = OrderDraft {
        shipping_address1: payload.shipping_address1,
        shipping_address2: payload.shipping_address2,
        city: payload.city,
        zip: payload.zip,
        country: payload.country,
        phone: payload.phone,
        items: payload
            .order_items
            .iter()
            .map(|item| NewOrderItem {
                product_id: ProductId::new(item.product),
                quantity: item.quantity,
            })
            .collect(),
    };

    let summary = OrderService::new(state.pool())
        .create(auth.user_id, draft)
        .await?;

    Ok((StatusCode::CREATED, Json(summary.into())))
}

async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderDetailResponse>> {
    let id: OrderId = parse_id(&id)?;

    let status: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid order status: {}", payload.status)))?;

    let fields = OrderUpdate {
        shipping_address1: payload.shipping_address1,
        shipping_address2: payload.shipping_address2,
        city: payload.city,
        zip: payload.zip,
        country: payload.country,
        phone: payload.phone,
        status,
    };

    let service = OrderService::new(state.pool());
    service.update(id, &fields).await?;

    let order = service.get(id).await?;
    Ok(Json(order.into()))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: OrderId = parse_id(&id)?;
    OrderService::new(state.pool()).delete(id).await?;
    Ok(Json(json!({ "success": true, "message": "Order deleted" })))
}

async fn total_sales(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<Value>> {
    let total = OrderService::new(state.pool()).total_sales().await?;
    Ok(Json(json!({ "totalSales": total })))
}

async fn count(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<CountResponse>> {
    let count = OrderService::new(state.pool()).count().await?;
    Ok(Json(CountResponse { count }))
}

/// The caller's own orders, newest first.
async fn my_orders(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<UserOrderResponse>>> {
    let orders = OrderService::new(state.pool())
        .list_for_user(auth.user_id)
        .await?;

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use shophouse_core::{OrderItemId, UserId};

    use crate::models::Order;

    #[test]
    fn test_create_request_ignores_client_total_and_owner() {
        // A client cannot smuggle in a price or an owner: the request type
        // has no such fields, so both are dropped at deserialization.
        let payload = serde_json::json!({
            "orderItems": [{ "product": 3, "quantity": 2 }],
            "shippingAddress1": "1 Main St",
            "city": "Springfield",
            "zip": "12345",
            "country": "US",
            "phone": "555-0100",
            "totalPrice": 0.01,
            "user": 999
        });

        let parsed: CreateOrderRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.order_items.len(), 1);
        assert_eq!(parsed.order_items[0].product, 3);
        assert_eq!(parsed.order_items[0].quantity, 2);
        assert_eq!(parsed.shipping_address1, "1 Main St");
    }

    fn summary() -> OrderSummary {
        OrderSummary {
            order: Order {
                id: OrderId::new(11),
                shipping_address1: "1 Main St".to_owned(),
                shipping_address2: String::new(),
                city: "Springfield".to_owned(),
                zip: "12345".to_owned(),
                country: "US".to_owned(),
                phone: "555-0100".to_owned(),
                status: OrderStatus::Pending,
                total_price: Decimal::new(50, 0),
                user_id: UserId::new(7),
                created_at: Utc::now(),
            },
            item_ids: vec![OrderItemId::new(21), OrderItemId::new(22)],
        }
    }

    #[test]
    fn test_user_order_response_carries_item_ids() {
        let body = serde_json::to_value(UserOrderResponse::from(summary())).unwrap();
        assert_eq!(body["orderItems"], serde_json::json!([21, 22]));
        assert_eq!(body["status"], "pending");
        // The owner listing never echoes the user back
        assert!(body.get("user").is_none());
    }

    #[test]
    fn test_order_response_wire_shape() {
        let body = serde_json::to_value(OrderResponse::from(summary())).unwrap();
        assert_eq!(body["orderItems"], serde_json::json!([21, 22]));
        assert_eq!(body["user"], 7);
        assert_eq!(body["status"], "pending");
    }
}
