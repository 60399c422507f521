//! Postgres-backed submission storage (feature `sqlx_postgres`).

pub mod migrations;
mod submission;

pub use submission::PostgresSubmissionRepository;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::SiteError;

/// Connects, runs migrations and returns the repository.
pub async fn connect(database_url: &str) -> Result<PostgresSubmissionRepository, SiteError> {
    let pool: PgPool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|e| SiteError::Database(e.to_string()))?;

    migrations::run(&pool)
        .await
        .map_err(|e| SiteError::Database(e.to_string()))?;

    log::info!(target: "makerspace_admin", "msg=\"database ready\"");

    Ok(PostgresSubmissionRepository::new(pool))
}
