//! User routes: registration, login, and account administration.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shophouse_core::{Email, UserId};

use super::{CountResponse, map_conflict, parse_id};
use crate::db::users::{UserFields, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService, Registration, hash_password, validate_password};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/get/count", get(count))
        .route("/{id}", get(get_one).put(update).delete(remove))
}

/// User as exposed over the wire. The password hash never leaves the
/// server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: i32,
    name: String,
    email: String,
    phone: String,
    is_admin: bool,
    street: String,
    apartment: String,
    zip: String,
    city: String,
    country: String,
    date_created: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name,
            email: user.email.as_str().to_owned(),
            phone: user.phone,
            is_admin: user.is_admin,
            street: user.street,
            apartment: user.apartment,
            zip: user.zip,
            city: user.city,
            country: user.country,
            date_created: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    street: String,
    #[serde(default)]
    apartment: String,
    #[serde(default)]
    zip: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    email: String,
    name: String,
    is_admin: bool,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    name: String,
    email: String,
    /// When present, replaces the stored password.
    password: Option<String>,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    street: String,
    #[serde(default)]
    apartment: String,
    #[serde(default)]
    zip: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
}

async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<UserResponse>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// The authenticated caller's own profile.
async fn profile(auth: RequireAuth) -> Json<UserResponse> {
    Json(auth.user.into())
}

async fn get_one(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let id: UserId = parse_id(&id)?;

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User with the given ID".to_string()))?;

    Ok(Json(user.into()))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    // Public registration never grants the admin flag; admins are created
    // via the CLI or promoted by an existing admin.
    let registration = Registration {
        name: payload.name,
        email: payload.email,
        password: payload.password,
        phone: payload.phone,
        is_admin: false,
        street: payload.street,
        apartment: payload.apartment,
        zip: payload.zip,
        city: payload.city,
        country: payload.country,
    };

    let user = AuthService::new(state.pool(), state.tokens())
        .register(registration)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let (user, token) = AuthService::new(state.pool(), state.tokens())
        .login(&payload.email, &payload.password)
        .await?;

    let data = LoginData {
        email: user.email.as_str().to_owned(),
        name: user.name,
        is_admin: user.is_admin,
        token,
    };

    Ok(Json(json!({ "status": "success", "data": data })))
}

async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let id: UserId = parse_id(&id)?;

    // Users can edit their own account; everyone else's requires admin.
    if auth.user_id != id && !auth.user.is_admin {
        return Err(AuthError::Forbidden.into());
    }

    let repo = UserRepository::new(state.pool());

    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User with the given ID".to_string()))?;

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            hash_password(password)?
        }
        None => existing.password_hash,
    };

    let email =
        Email::parse(&payload.email).map_err(|e| AppError::Auth(AuthError::InvalidEmail(e)))?;

    // Only admins can grant or revoke the admin flag.
    let is_admin = if auth.user.is_admin {
        payload.is_admin
    } else {
        existing.is_admin
    };

    let fields = UserFields {
        name: payload.name,
        email,
        password_hash,
        phone: payload.phone,
        is_admin,
        street: payload.street,
        apartment: payload.apartment,
        zip: payload.zip,
        city: payload.city,
        country: payload.country,
    };

    let user = repo
        .update(id, &fields)
        .await
        .map_err(|e| map_conflict(e, "User"))?
        .ok_or_else(|| AppError::NotFound("User with the given ID".to_string()))?;

    Ok(Json(user.into()))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: UserId = parse_id(&id)?;

    if UserRepository::new(state.pool()).delete(id).await? {
        Ok(Json(json!({ "success": true, "message": "User deleted" })))
    } else {
        Err(AppError::NotFound("User with the given ID".to_string()))
    }
}

async fn count(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<CountResponse>> {
    let count = UserRepository::new(state.pool()).count().await?;
    Ok(Json(CountResponse { count }))
}
