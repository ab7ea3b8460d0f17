//! Category model.

use shophouse_core::CategoryId;

/// A product category (name, display icon, color tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
    pub color: String,
}
