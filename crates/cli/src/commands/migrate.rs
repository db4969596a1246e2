//! Database migration command.
//!
//! Runs the migrations embedded in the server crate. The sessions table is
//! not managed here; tower-sessions creates it at server startup.

use super::{CliError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    moostyle_server::db::MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}
