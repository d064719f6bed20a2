use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;

/// Opens the bounded connection pool shared by every request.
pub async fn connect(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .max_lifetime(cfg.max_lifetime())
        .connect(&cfg.url)
        .await
        .context("connect to database")?;
    tracing::info!(
        max_connections = cfg.max_connections,
        max_lifetime_secs = cfg.max_lifetime_secs,
        "database pool ready"
    );
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) {
    if let Err(e) = sqlx::migrate!("./migrations").run(pool).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }
}

pub async fn ping(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("ping database")?;
    Ok(())
}
