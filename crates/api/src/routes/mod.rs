//! HTTP route handlers.
//!
//! Each resource gets its own module and router; auth gating is expressed
//! through the `RequireAuth`/`RequireAdmin` extractor arguments on the
//! handlers themselves.

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;

use axum::Router;
use serde::Serialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::state::AppState;

/// Assemble the versioned API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/category", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/users", users::router())
}

/// Body shape shared by the collection-count endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct CountResponse {
    pub count: i64,
}

/// Parse a path segment into a typed id, rejecting garbage with a 400
/// before any query runs.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, AppError> {
    raw.parse().map_err(|_| AppError::InvalidId(raw.to_owned()))
}

/// Turn a repository unique violation into the client-facing duplicate
/// error, passing everything else through.
pub(crate) fn map_conflict(err: RepositoryError, what: &str) -> AppError {
    match err {
        RepositoryError::Conflict(_) => AppError::Duplicate(what.to_owned()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shophouse_core::ProductId;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<ProductId>("17").unwrap(), ProductId::new(17));
        assert!(matches!(
            parse_id::<ProductId>("not-a-number"),
            Err(AppError::InvalidId(_))
        ));
    }

    #[test]
    fn test_map_conflict() {
        let err = map_conflict(RepositoryError::Conflict("name".to_string()), "Shoes");
        assert!(matches!(err, AppError::Duplicate(name) if name == "Shoes"));

        let err = map_conflict(RepositoryError::NotFound, "Shoes");
        assert!(matches!(err, AppError::Database(_)));
    }
}
