//! Business logic services sitting between the route handlers and the
//! repositories.

pub mod auth;
pub mod orders;
pub mod uploads;
