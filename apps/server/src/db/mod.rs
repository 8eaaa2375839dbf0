//! Database layer - schema mapping, SQL rendering and query execution

pub mod executor;
pub mod schema;
pub mod sql;

pub use executor::PgExecutor;
pub use schema::{ColumnMapping, RelationMapping, Schema, TableMapping};
pub use sql::{BindValue, SqlBuilder};

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Open the connection pool, applying the statement timeout to every
/// connection it creates.
pub async fn connect(config: &DatabaseConfig) -> crate::Result<PgPool> {
    let statement_timeout_ms = config.statement_timeout_seconds * 1000;

    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_size)
        .max_connections(config.pool_max_size)
        .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if statement_timeout_ms > 0 {
                    sqlx::query(&format!("SET statement_timeout = {statement_timeout_ms}"))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    Ok(pool)
}
