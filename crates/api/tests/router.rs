//! Router surface tests.
//!
//! These exercise the parts of the HTTP surface that resolve before any
//! database I/O: route matching, the 404 fallback contract, id validation,
//! and bearer-token screening. The pool is built lazily so no database is
//! required.

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use shophouse_api::build_router;
use shophouse_api::config::ApiConfig;
use shophouse_api::services::auth::TokenService;
use shophouse_api::services::uploads::ImageStore;
use shophouse_api::state::AppState;

fn test_app() -> Router {
    let config = ApiConfig {
        database_url: SecretString::from("postgres://localhost/unreachable"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_path: "/api/v1".to_string(),
        token_secret: SecretString::from("k9#mW2$vB7@qX4!nZ8&cJ3^fL6*tR1%d"),
        token_ttl: Duration::from_secs(3600),
        uploads_dir: PathBuf::from(std::env::temp_dir().join("shophouse-router-test")),
        request_timeout: Duration::from_secs(5),
    };

    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unreachable")
        .unwrap();

    let tokens = TokenService::new(&config.token_secret, config.token_ttl);
    let images = ImageStore::new(config.uploads_dir.clone()).unwrap();

    build_router(AppState::new(config, pool, tokens, images))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_fallback_contract() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/nonexistent/route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "/api/v1/nonexistent/route - Route not found");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/api/v1/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/users")
                .header(header::AUTHORIZATION, "Bearer not.a.real.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid/Expired token, please login again");
}

#[tokio::test]
async fn test_protected_route_with_wrong_scheme() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/category")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_id_rejected_before_query() {
    let app = test_app();

    // Public route, so the id check is the first thing that can fail
    let response = app
        .oneshot(
            Request::get("/api/v1/category/not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid ID: not-a-number");
}

#[tokio::test]
async fn test_malformed_category_filter_rejected() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/products?categories=1,frocks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid ID: frocks");
}

#[tokio::test]
async fn test_negative_featured_count_rejected() {
    let app = test_app();

    // Public route; the count is validated before the catalog query runs
    let response = app
        .oneshot(
            Request::get("/api/v1/products/get/featured/-3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid featured count: -3");
}

#[tokio::test]
async fn test_routes_mounted_under_base_path() {
    let app = test_app();

    // The same path without the base prefix must hit the fallback
    let response = app
        .oneshot(Request::get("/category").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "/category - Route not found");
}
