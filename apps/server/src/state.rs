//! Shared application state

use crate::config::Config;
use crate::db::{self, Schema};
use crate::{Error, Result};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub schema: Arc<Schema>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Validate the schema and open the database pool.
    pub async fn new(config: Config) -> Result<Self> {
        let schema = load_schema(&config)?;
        let db_pool = db::connect(&config.database).await?;

        tracing::info!(
            entities = schema.registry().len(),
            pool_max_size = config.database.pool_max_size,
            "Application state initialized"
        );

        Ok(Self {
            db_pool,
            schema: Arc::new(schema),
            config: Arc::new(config),
        })
    }

    /// Build state around an existing pool.
    pub fn with_pool(config: Config, db_pool: PgPool) -> Result<Self> {
        let schema = load_schema(&config)?;
        Ok(Self {
            db_pool,
            schema: Arc::new(schema),
            config: Arc::new(config),
        })
    }
}

fn load_schema(config: &Config) -> Result<Schema> {
    Schema::from_config(&config.schema.entities)
        .map_err(|e| Error::Config(format!("invalid schema: {e}")))
}
