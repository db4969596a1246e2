//! CLI command implementations.

pub mod admin;
pub mod drill;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Repository(#[from] moostyle_server::db::RepositoryError),

    #[error("{0}")]
    Auth(#[from] moostyle_server::services::auth::AuthError),

    #[error("{0}")]
    Recovery(#[from] moostyle_server::services::recovery::RecoveryError),
}

/// Connect to the database named by `MOOSTYLE_DATABASE_URL` / `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("MOOSTYLE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("MOOSTYLE_DATABASE_URL"))?;

    Ok(moostyle_server::db::create_pool(&SecretString::from(url)).await?)
}
