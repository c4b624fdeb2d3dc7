use anyhow::{Context, Result};
use sqlx::PgPool;

/// Applies pending migrations for matches, date cards and notifications.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to apply date card schema migrations")?;
    tracing::info!("Database schema is up to date");
    Ok(())
}
