use rendezvous::db::{DatabaseConfig, get_db_pool, migrations};
use rendezvous::utils::init_logging;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    info!("🔄 Migrating matches, date_cards and notifications tables...");
    migrations::run_migrations(&pool).await?;

    let cards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM date_cards")
        .fetch_one(&pool)
        .await?;
    info!("✅ Migrations complete ({} date cards on record)", cards);

    Ok(())
}
