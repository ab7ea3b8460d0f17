//! Unified error handling for the REST surface.
//!
//! Provides a unified `AppError` type mapping classified failures to HTTP
//! status codes. All route handlers return `Result<T, AppError>`. Failure
//! bodies follow the `{"success": false, "message": "..."}` contract.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication or authorization failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// An entity with the same unique field already exists.
    #[error("{0} already exists in the database")]
    Duplicate(String),

    /// Resource not found.
    #[error("{0} is not found")]
    NotFound(String),

    /// Malformed identifier.
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Product references a category that does not exist.
    #[error("Invalid Category ID")]
    InvalidCategory,

    /// Product creation requires an image attachment.
    #[error("Product image file is missing")]
    MissingImage,

    /// The final order persist step failed.
    #[error("Order Not Created")]
    OrderCreationFailed,

    /// A store-side aggregation failed.
    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Aggregation(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::InvalidCredentials
                | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_)
            | Self::InvalidCategory
            | Self::MissingImage
            | Self::OrderCreationFailed
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details are not exposed.
    fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                // Unknown email and wrong password are indistinguishable
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid login credentials".to_string()
                }
                AuthError::MissingToken => "Authentication required".to_string(),
                AuthError::InvalidToken => {
                    "Invalid/Expired token, please login again".to_string()
                }
                AuthError::Forbidden => "Admin access required".to_string(),
                AuthError::UserAlreadyExists => "User already exists".to_string(),
                AuthError::InvalidEmail(e) => e.to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Aggregation(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        ) {
            tracing::error!(error = %self, "Request error");
        }

        let body = json!({
            "success": false,
            "message": self.message(),
        });

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("Product with the ID".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Duplicate("Shoes".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(get_status(AppError::InvalidCategory), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AppError::MissingImage), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::OrderCreationFailed),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::MissingToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        // Unknown email and wrong password must produce the same message
        let unknown = AppError::Auth(AuthError::UserNotFound);
        let wrong = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(unknown.message(), wrong.message());
        assert_eq!(unknown.status(), wrong.status());
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::Internal("connection refused to 10.0.0.3".to_string());
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_expired_token_message_contract() {
        let err = AppError::Auth(AuthError::InvalidToken);
        assert_eq!(err.message(), "Invalid/Expired token, please login again");
    }
}
