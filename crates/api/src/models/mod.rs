//! Domain models backed by the database.

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::Category;
pub use order::{Order, OrderDetail, OrderItemDetail, OrderSummary};
pub use product::{Product, ProductWithCategory};
pub use user::User;
