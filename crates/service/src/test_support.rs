#![cfg(test)]
use migration::MigratorTrait;
use models::db::{connect_in_memory, connect_with_config};
use sea_orm::DatabaseConnection;

/// Fresh migrated in-memory database; every call is isolated from the others.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = connect_in_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Postgres from `DATABASE_URL` / `DB_*`, migrated. `None` when not configured.
pub async fn get_postgres_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(None); }
    let mut cfg = configs::DatabaseConfig { min_connections: 1, max_connections: 5, ..Default::default() };
    cfg.normalize_from(&|k: &str| std::env::var(k).ok());
    if cfg.url.trim().is_empty() || cfg.url.starts_with("sqlite") { return Ok(None); }
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Some(db))
}
