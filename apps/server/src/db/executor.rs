//! PostgreSQL execution of the engine's queries

use super::schema::Schema;
use super::sql::{BindValue, SqlBuilder};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sieve_query::{
    CountQuery, Error, FetchQuery, KeyQuery, QueryExecutor, Result, ScalarType, Value,
};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

/// Bind every value in order; placeholders were numbered in the same order.
macro_rules! bind_all {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                BindValue::Bool(v) => query.bind(v),
                BindValue::SmallInt(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
                BindValue::BigInt(v) => query.bind(v),
                BindValue::Uuid(v) => query.bind(v),
                BindValue::Text(v) => query.bind(v),
                BindValue::BoolArray(vs) => query.bind(vs),
                BindValue::SmallIntArray(vs) => query.bind(vs),
                BindValue::IntArray(vs) => query.bind(vs),
                BindValue::BigIntArray(vs) => query.bind(vs),
                BindValue::UuidArray(vs) => query.bind(vs),
                BindValue::TextArray(vs) => query.bind(vs),
            };
        }
        query
    }};
}

/// Runs queries on one borrowed connection, strictly one after another.
pub struct PgExecutor<'c> {
    conn: &'c mut PgConnection,
    schema: &'c Schema,
}

impl<'c> PgExecutor<'c> {
    pub fn new(conn: &'c mut PgConnection, schema: &'c Schema) -> Self {
        Self { conn, schema }
    }

    fn key_type(&self, entity: &str) -> Result<ScalarType> {
        Ok(self.schema.table(entity)?.primary_key.scalar_type)
    }
}

#[async_trait]
impl<'c> QueryExecutor for PgExecutor<'c> {
    async fn select_keys(&mut self, query: &KeyQuery) -> Result<Vec<Value>> {
        let (sql, bind_values) = SqlBuilder::new(self.schema).build_key_sql(query)?;
        tracing::debug!(sql = %sql, binds = bind_values.len(), "Executing key query");

        let key_type = self.key_type(&query.entity)?;
        let rows = bind_all!(sqlx::query(&sql), bind_values)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(database_error)?;

        rows.iter().map(|row| decode_key(row, key_type)).collect()
    }

    async fn count(&mut self, query: &CountQuery) -> Result<i64> {
        let (sql, bind_values) = SqlBuilder::new(self.schema).build_count_sql(query)?;
        tracing::debug!(sql = %sql, binds = bind_values.len(), "Executing count query");

        bind_all!(sqlx::query_scalar::<_, i64>(&sql), bind_values)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(database_error)
    }

    async fn fetch_rows(&mut self, query: &FetchQuery) -> Result<Vec<JsonValue>> {
        let (sql, bind_values) = SqlBuilder::new(self.schema).build_fetch_sql(query)?;
        tracing::debug!(sql = %sql, keys = query.keys.len(), "Executing fetch query");

        bind_all!(sqlx::query_scalar::<_, JsonValue>(&sql), bind_values)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(database_error)
    }
}

fn decode_key(row: &PgRow, key_type: ScalarType) -> Result<Value> {
    let value = match key_type {
        ScalarType::Boolean => row.try_get(0).map(Value::Bool),
        ScalarType::SmallInt => row.try_get(0).map(Value::SmallInt),
        ScalarType::Integer => row.try_get(0).map(Value::Int),
        ScalarType::BigInt => row.try_get(0).map(Value::BigInt),
        ScalarType::Uuid => row.try_get(0).map(Value::Uuid),
        ScalarType::Text => row.try_get(0).map(Value::Text),
    };
    value.map_err(database_error)
}

fn database_error(e: sqlx::Error) -> Error {
    Error::Execution(e.to_string())
}
