//! Persistence boundary: parameterized SQL in, field-named records out.
//!
//! The contract is autocommit. Every call is its own unit of work; there is no
//! way to group calls into a transaction through this trait.

pub mod auth_store;
pub mod postgres;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use featreq_core::StoreError;

pub use auth_store::SqlAuthStore;
pub use postgres::PostgresDatabase;

/// One result row keyed by column name.
pub type Record = serde_json::Map<String, JsonValue>;

/// Synchronous SQL executor.
///
/// Parameters are positional (`$1`, `$2`, ...) and given as JSON values:
/// strings, numbers, booleans and null bind as their scalar SQL counterparts.
/// Callers add explicit casts (`$1::date`, `$2::uuid`) where the column type
/// is not text or numeric.
pub trait Database: Send + Sync {
    /// Run a statement that returns no rows; yields the number of rows affected.
    fn execute(&self, sql: &str, params: &[JsonValue]) -> Result<u64, StoreError>;

    /// Run a query and return every row.
    fn query(&self, sql: &str, params: &[JsonValue]) -> Result<Vec<Record>, StoreError>;

    /// Run a query and return the first row, if any.
    fn query_one(&self, sql: &str, params: &[JsonValue]) -> Result<Option<Record>, StoreError> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}

impl<D> Database for Arc<D>
where
    D: Database + ?Sized,
{
    fn execute(&self, sql: &str, params: &[JsonValue]) -> Result<u64, StoreError> {
        (**self).execute(sql, params)
    }

    fn query(&self, sql: &str, params: &[JsonValue]) -> Result<Vec<Record>, StoreError> {
        (**self).query(sql, params)
    }

    fn query_one(&self, sql: &str, params: &[JsonValue]) -> Result<Option<Record>, StoreError> {
        (**self).query_one(sql, params)
    }
}

/// Decode a record into a typed row.
pub fn decode<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    serde_json::from_value(JsonValue::Object(record)).map_err(|e| StoreError::decode(e.to_string()))
}

#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    //! Scripted `Database` double: records every statement and replays queued results.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct ScriptedDatabase {
        pub statements: Mutex<Vec<(String, Vec<JsonValue>)>>,
        results: Mutex<VecDeque<Vec<Record>>>,
    }

    impl ScriptedDatabase {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the rows returned by the next `query`/`query_one` call.
        pub fn push_rows(&self, rows: Vec<JsonValue>) {
            let rows = rows
                .into_iter()
                .map(|row| match row {
                    JsonValue::Object(map) => map,
                    other => panic!("row must be an object, got {other}"),
                })
                .collect();
            self.results.lock().unwrap().push_back(rows);
        }

        pub fn statements(&self) -> Vec<(String, Vec<JsonValue>)> {
            self.statements.lock().unwrap().clone()
        }

        fn record(&self, sql: &str, params: &[JsonValue]) {
            self.statements
                .lock()
                .unwrap()
                .push((normalize(sql), params.to_vec()));
        }
    }

    fn normalize(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    impl Database for ScriptedDatabase {
        fn execute(&self, sql: &str, params: &[JsonValue]) -> Result<u64, StoreError> {
            self.record(sql, params);
            Ok(1)
        }

        fn query(&self, sql: &str, params: &[JsonValue]) -> Result<Vec<Record>, StoreError> {
            self.record(sql, params);
            Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
        }
    }
}
