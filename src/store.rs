//! Connection pool setup. `DATABASE_URL` selects the store.

use crate::config::PoolConfig;
use crate::error::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub fn database_url() -> String {
    std::env::var(DATABASE_URL_ENV).unwrap_or_else(|_| "postgres://localhost/negocios".into())
}

fn pool_options(config: &PoolConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}

/// Bounded pool: a request waits at most `acquire_timeout_secs` for a connection, then fails.
pub async fn connect_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool, AppError> {
    let pool = pool_options(config).connect(database_url).await?;
    tracing::info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Same limits, but no connection is opened until first use.
pub fn connect_pool_lazy(database_url: &str, config: &PoolConfig) -> Result<PgPool, AppError> {
    Ok(pool_options(config).connect_lazy(database_url)?)
}
