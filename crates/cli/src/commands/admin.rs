//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! shophouse-cli admin create -e admin@example.com -n "Admin Name" -p "a strong password"
//! ```

use shophouse_api::db::RepositoryError;
use shophouse_api::db::users::{UserFields, UserRepository};
use shophouse_api::services::auth::{hash_password, validate_password};
use shophouse_core::Email;

use super::{CommandError, connect};

/// Create a new admin user.
///
/// The same password rules apply here as on the public registration
/// endpoint; a bootstrap admin does not get to pick a weak password.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), CommandError> {
    let email =
        Email::parse(email).map_err(|e| CommandError::InvalidEmail(e.to_string()))?;

    validate_password(password).map_err(|e| CommandError::WeakPassword(e.to_string()))?;
    let password_hash = hash_password(password).map_err(|_| CommandError::PasswordHash)?;

    let pool = connect().await?;

    let fields = UserFields {
        name: name.to_owned(),
        email: email.clone(),
        password_hash,
        phone: String::new(),
        is_admin: true,
        street: String::new(),
        apartment: String::new(),
        zip: String::new(),
        city: String::new(),
        country: String::new(),
    };

    let user = UserRepository::new(&pool)
        .create(&fields)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CommandError::UserExists(email.as_str().to_owned()),
            RepositoryError::Database(e) => CommandError::Database(e),
            other => CommandError::Database(sqlx::Error::Protocol(other.to_string())),
        })?;

    tracing::info!(id = user.id.as_i32(), email = email.as_str(), "Admin user created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Input checks run before any database connection is made.

    #[tokio::test]
    async fn test_create_user_rejects_short_password() {
        let result = create_user("admin@example.com", "Admin", "short").await;
        assert!(matches!(result, Err(CommandError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_email() {
        let result = create_user("not-an-email", "Admin", "long enough password").await;
        assert!(matches!(result, Err(CommandError::InvalidEmail(_))));
    }
}
