//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shophouse_core::{Email, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::User;

const USER_SELECT: &str = r"
    SELECT id, name, email, password_hash, phone, is_admin,
           street, apartment, zip, city, country, created_at
    FROM shop_user
";

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    is_admin: bool,
    street: String,
    apartment: String,
    zip: String,
    city: String,
    country: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            password_hash: row.password_hash,
            phone: row.phone,
            is_admin: row.is_admin,
            street: row.street,
            apartment: row.apartment,
            zip: row.zip,
            city: row.city,
            country: row.country,
            created_at: row.created_at,
        })
    }
}

/// Field bundle for creating or updating a user.
///
/// `password_hash` is already hashed; repositories never see plaintext.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub phone: String,
    pub is_admin: bool,
    pub street: String,
    pub apartment: String,
    pub zip: String,
    pub city: String,
    pub country: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} ORDER BY created_at DESC"))
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, fields: &UserFields) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop_user (name, email, password_hash, phone, is_admin,
                                   street, apartment, zip, city, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, email, password_hash, phone, is_admin,
                      street, apartment, zip, city, country, created_at
            ",
        )
        .bind(&fields.name)
        .bind(fields.email.as_str())
        .bind(&fields.password_hash)
        .bind(&fields.phone)
        .bind(fields.is_admin)
        .bind(&fields.street)
        .bind(&fields.apartment)
        .bind(&fields.zip)
        .bind(&fields.city)
        .bind(&fields.country)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        row.try_into()
    }

    /// Update a user. Returns `None` if the id does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email collides.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: UserId,
        fields: &UserFields,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE shop_user
            SET name = $2, email = $3, password_hash = $4, phone = $5,
                is_admin = $6, street = $7, apartment = $8, zip = $9,
                city = $10, country = $11
            WHERE id = $1
            RETURNING id, name, email, password_hash, phone, is_admin,
                      street, apartment, zip, city, country, created_at
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(fields.email.as_str())
        .bind(&fields.password_hash)
        .bind(&fields.phone)
        .bind(fields.is_admin)
        .bind(&fields.street)
        .bind(&fields.apartment)
        .bind(&fields.zip)
        .bind(&fields.city)
        .bind(&fields.country)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        row.map(TryInto::try_into).transpose()
    }

    /// Count users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shop_user")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Delete a user.
    ///
    /// # Returns
    ///
    /// `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
