//! Database migration command.
//!
//! Applies the migrations embedded in `rollcall-api` (the same set the
//! server runs on startup).
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use rollcall_api::db;

use super::{CommandError, connect};

/// Run pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(
        available = db::MIGRATOR.iter().count(),
        "Running migrations..."
    );
    db::run_migrations(&pool).await?;
    tracing::info!("Migrations complete!");

    pool.close().await;
    Ok(())
}
