use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use std::time::Duration;
use tracing::{info, warn};

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Creates a lazily-connecting PostgreSQL pool.
///
/// No connection is attempted here, so the service comes up even when the
/// database is unreachable; inserts then fail over to the local JSON store.
pub fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Configuring PostgreSQL pool (lazy connect)");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)?;

    Ok(pool)
}

/// Applies the embedded schema. Every statement is idempotent.
/// Errors are logged and swallowed: a missing database must not stop startup.
pub async fn apply_schema(pool: &PgPool) {
    match pool.execute(SCHEMA).await {
        Ok(_) => info!("Database schema applied"),
        Err(e) => warn!("Skipping schema migration, database unavailable: {e}"),
    }
}
