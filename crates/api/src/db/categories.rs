//! Category repository.

use sqlx::PgPool;

use shophouse_core::CategoryId;

use super::{RepositoryError, map_unique_violation};
use crate::models::Category;

/// Internal row type for category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    icon: String,
    color: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            icon: row.icon,
            color: row.color,
        }
    }
}

/// Field bundle for creating or updating a category.
#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, icon, color FROM category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, icon, color FROM category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, fields: &CategoryFields) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO category (name, icon, color)
            VALUES ($1, $2, $3)
            RETURNING id, name, icon, color
            ",
        )
        .bind(&fields.name)
        .bind(&fields.icon)
        .bind(&fields.color)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &fields.name))?;

        Ok(row.into())
    }

    /// Update a category. Returns `None` if the id does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new name collides.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CategoryId,
        fields: &CategoryFields,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE category
            SET name = $2, icon = $3, color = $4
            WHERE id = $1
            RETURNING id, name, icon, color
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.icon)
        .bind(&fields.color)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &fields.name))?;

        Ok(row.map(Into::into))
    }

    /// Delete a category.
    ///
    /// # Returns
    ///
    /// `true` if the category was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count categories. An empty collection is a legitimate zero, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM category")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
