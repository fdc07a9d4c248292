//! Subcommand implementations.

pub mod migrate;
pub mod seed;

use rollcall_api::config::{ApiConfig, ConfigError};
use rollcall_api::db::{self, RepositoryError};
use rollcall_core::ValidationError;
use sqlx::PgPool;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid sample data: {0}")]
    Validation(#[from] ValidationError),
}

/// Load configuration and open a pool against `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    let config = ApiConfig::from_env()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&config.database).await?)
}
