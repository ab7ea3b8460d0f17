//! Shophouse REST API.
//!
//! Catalog, account, and order management for the store, served over HTTP.
//! Resource routes are mounted under the configured base path; uploaded
//! product images are served from `/public/uploads`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::state::AppState;

/// Build the full application router: resource routes under the base path,
/// static uploads, health probes, and the ambient middleware layers.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api = routes::api_router();

    let app = if state.config().base_path == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&state.config().base_path, api)
    };

    app.route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest_service("/public/uploads", ServeDir::new(state.images().dir()))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(state.config().request_timeout))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe: verifies the database is reachable.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

async fn fallback(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("{} - Route not found", uri.path()) })),
    )
}
