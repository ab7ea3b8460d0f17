//! User model.

use chrono::{DateTime, Utc};

use shophouse_core::{Email, UserId};

/// A registered user.
///
/// `password_hash` is an argon2 PHC string; the plaintext is never stored.
/// Response DTOs must not serialize the hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
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
    pub created_at: DateTime<Utc>,
}
