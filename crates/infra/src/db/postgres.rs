//! Postgres-backed [`Database`] over a sqlx pool.
//!
//! Rows are converted to JSON records server-side with `row_to_json`, so any
//! statement that yields rows (a `SELECT`, or DML with `RETURNING`) can be used
//! with `query`.
//!
//! ## Threading
//!
//! The trait is synchronous. Calls block on the captured tokio runtime handle,
//! so they must run on a thread that is not driving async tasks (for example
//! inside `tokio::task::spawn_blocking`).

use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tokio::runtime::Handle;
use tracing::instrument;

use featreq_core::StoreError;

use super::{Database, Record};

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    runtime: Handle,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool, runtime: Handle) -> Self {
        Self { pool, runtime }
    }

    /// Connect a pool and capture the current runtime handle.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Self::new(pool, Handle::current()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Database for PostgresDatabase {
    #[instrument(skip(self, params), err)]
    fn execute(&self, sql: &str, params: &[JsonValue]) -> Result<u64, StoreError> {
        let query = bind_params(sqlx::query(sql), params);
        let result = self
            .runtime
            .block_on(query.execute(&self.pool))
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, params), err)]
    fn query(&self, sql: &str, params: &[JsonValue]) -> Result<Vec<Record>, StoreError> {
        let wrapped = wrap_as_json(sql);
        let query = bind_params(sqlx::query(&wrapped), params);
        let rows = self
            .runtime
            .block_on(query.fetch_all(&self.pool))
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                let value: JsonValue = row
                    .try_get("record")
                    .map_err(|e| StoreError::decode(e.to_string()))?;
                into_record(value)
            })
            .collect()
    }
}

fn wrap_as_json(sql: &str) -> String {
    format!("WITH q AS ({sql}) SELECT row_to_json(q)::jsonb AS record FROM q")
}

fn into_record(value: JsonValue) -> Result<Record, StoreError> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(StoreError::decode(format!("expected a row object, got {other}"))),
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [JsonValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            JsonValue::Null => query.bind(None::<String>),
            JsonValue::Bool(b) => query.bind(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            JsonValue::String(s) => query.bind(s.as_str()),
            other => query.bind(other.clone()),
        };
    }
    query
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::decode(err.to_string()),
        other => StoreError::backend(other.to_string()),
    }
}
