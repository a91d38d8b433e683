//! Query-execution boundary.
//!
//! Models never own a database handle. They receive something implementing
//! [`QueryExecutor`] and hand it parameterized SQL; the caller decides what is
//! behind it (a Postgres pool in production, [`ScriptedExecutor`] in tests).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::StoreError;
use crate::sql::SqlValue;

/// One result row, keyed by (aliased) column name.
pub type Row = serde_json::Map<String, JsonValue>;

/// Parameterized statement execution.
///
/// `params[i - 1]` binds placeholder `$i`. Statements without a result set
/// return an empty vector.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError>;
}

#[async_trait::async_trait]
impl<E> QueryExecutor for Arc<E>
where
    E: QueryExecutor + ?Sized,
{
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError> {
        (**self).execute(sql, params).await
    }
}

#[async_trait::async_trait]
impl<E> QueryExecutor for &E
where
    E: QueryExecutor + ?Sized,
{
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError> {
        (**self).execute(sql, params).await
    }
}

/// Turn a row into a typed record.
pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(JsonValue::Object(row)).map_err(|e| StoreError::decode(e.to_string()))
}

/// A statement seen by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Executor for tests/dev that replays prepared responses.
///
/// Responses are consumed in FIFO order, one per `execute` call. Once the
/// queue is empty every call returns no rows. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<Vec<Row>, StoreError>>>,
    calls: Mutex<Vec<RecordedQuery>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.lock_responses().push_back(Ok(rows));
        self
    }

    /// Queue rows given as a JSON array of objects. Non-object entries are skipped.
    pub fn push_json(&self, rows: JsonValue) -> &Self {
        let rows = match rows {
            JsonValue::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    JsonValue::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
            JsonValue::Object(row) => vec![row],
            _ => vec![],
        };
        self.push_rows(rows)
    }

    pub fn push_error(&self, err: StoreError) -> &Self {
        self.lock_responses().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<RecordedQuery> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_call(&self) -> Option<RecordedQuery> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Vec<Row>, StoreError>>> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedQuery {
                sql: sql.to_string(),
                params,
            });

        self.lock_responses().pop_front().unwrap_or_else(|| Ok(vec![]))
    }
}
