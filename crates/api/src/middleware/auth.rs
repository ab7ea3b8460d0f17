//! Bearer-token authentication extractors.
//!
//! `RequireAuth` verifies the token and loads the caller; `RequireAdmin`
//! additionally checks the admin flag. Handlers opt into protection by
//! taking one of these as an argument, so the route table stays the single
//! place where gating is visible.

use axum::{extract::FromRequestParts, http::request::Parts};

use shophouse_core::UserId;

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Authenticated request context: any logged-in user.
#[derive(Debug)]
pub struct RequireAuth {
    pub user_id: UserId,
    pub user: User,
}

/// Authenticated request context: admin users only.
#[derive(Debug)]
pub struct RequireAdmin {
    pub user_id: UserId,
    pub user: User,
}

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Verify the token and load the user it identifies. A token whose user no
/// longer exists is treated as invalid.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<(UserId, User), AuthError> {
    let token = bearer_token(parts)?;
    let user_id = state.tokens().verify(token)?;

    let user = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok((user_id, user))
}

/// The admin gate: a valid token is not enough for admin routes.
fn ensure_admin(user: &User) -> Result<(), AuthError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user_id, user) = authenticate(parts, state).await?;
        Ok(Self { user_id, user })
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user_id, user) = authenticate(parts, state).await?;
        ensure_admin(&user)?;

        Ok(Self { user_id, user })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_rejected() {
        let parts = parts_with_auth(None);
        assert!(matches!(bearer_token(&parts), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&parts), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_empty_token_rejected() {
        let parts = parts_with_auth(Some("Bearer "));
        assert!(matches!(bearer_token(&parts), Err(AuthError::MissingToken)));
    }

    fn user(is_admin: bool) -> User {
        User {
            id: UserId::new(7),
            name: "Jo".to_owned(),
            email: shophouse_core::Email::parse("jo@example.com").unwrap(),
            password_hash: String::new(),
            phone: String::new(),
            is_admin,
            street: String::new(),
            apartment: String::new(),
            zip: String::new(),
            city: String::new(),
            country: String::new(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_non_admin_rejected_by_admin_gate() {
        assert!(matches!(
            ensure_admin(&user(false)),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn test_admin_passes_admin_gate() {
        assert!(ensure_admin(&user(true)).is_ok());
    }
}
