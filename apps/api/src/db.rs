use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;

/// A request waiting longer than this for a connection fails instead of queueing.
const ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Connection pool over the hosted database. The `profiles`, `etudiants`,
/// `notifications` and `tickets` tables are managed on the hosted side.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    info!(
        "Connecting to the hosted database (max {} connections)",
        config.database_max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(&config.database_url)
        .await
        .context("Could not connect to DATABASE_URL")?;

    info!("Database pool established");
    Ok(pool)
}
