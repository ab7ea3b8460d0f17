//! Database migration command.
//!
//! Applies the migrations embedded from `crates/api/migrations/` to the
//! database named by `SHOP_DATABASE_URL`.

use super::{CommandError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to store database...");
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
