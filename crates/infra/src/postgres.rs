//! Postgres-backed query executor.
//!
//! `PgExecutor` runs the parameterized SQL composed by the models against a
//! SQLx connection pool and hands rows back as JSON objects keyed by column
//! name.
//!
//! ## Parameter binding
//!
//! Each [`SqlValue`] is bound with its concrete type, `NULL`s included, so
//! Postgres can resolve placeholders against `INTEGER`/`NUMERIC` columns.
//!
//! ## Row decoding
//!
//! | Postgres type | JSON |
//! |---------------|------|
//! | `INT2`, `INT4`, `INT8` | number |
//! | `FLOAT4`, `FLOAT8` | number |
//! | `BOOL` | bool |
//! | `TEXT`, `VARCHAR`, `BPCHAR`, `NAME` | string |
//! | `NUMERIC` | decimal string (e.g. `"0.5"`) |
//! | `NULL` of any of the above | `null` |
//!
//! Any other column type is a `StoreError::Decode`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database | `Database` (SQLSTATE code and message kept) |
//! | PoolClosed, PoolTimedOut, Io, Tls | `Connection` |
//! | ColumnDecode, Decode, ColumnNotFound, TypeNotFound | `Decode` |
//! | Other | `Other` |

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};
use tracing::{Span, field, info, instrument};

use jobly_core::{QueryExecutor, Row, SqlValue, StoreError};

use crate::config::DbConfig;

/// Executor over a shared SQLx Postgres pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: Arc<PgPool>,
}

impl PgExecutor {
    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool using `config`.
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        info!(max_connections = config.max_connections, "postgres pool ready");
        Ok(Self::from_pool(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(
        skip(self, sql, params),
        fields(statement = field::Empty, params = params.len(), rows = field::Empty),
        err
    )]
    async fn run(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError> {
        let operation = statement_kind(sql);
        Span::current().record("statement", operation.as_str());

        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }

        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(&operation, e))?;

        let decoded = rows.iter().map(decode_pg_row).collect::<Result<Vec<_>, _>>()?;

        Span::current().record("rows", decoded.len());
        Ok(decoded)
    }
}

#[async_trait::async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, StoreError> {
        self.run(sql, params).await
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Decimal(v) => query.bind(v),
    }
}

/// Decode one row into a JSON object keyed by column name.
fn decode_pg_row(row: &PgRow) -> Result<Row, StoreError> {
    let mut out = Row::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let name = column.name();

        let value: Result<Option<JsonValue>, sqlx::Error> = match column.type_info().name() {
            "INT2" => row.try_get::<Option<i16>, _>(idx).map(|v| v.map(JsonValue::from)),
            "INT4" => row.try_get::<Option<i32>, _>(idx).map(|v| v.map(JsonValue::from)),
            "INT8" => row.try_get::<Option<i64>, _>(idx).map(|v| v.map(JsonValue::from)),
            "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(|v| v.map(JsonValue::from)),
            "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(|v| v.map(JsonValue::from)),
            "BOOL" => row.try_get::<Option<bool>, _>(idx).map(|v| v.map(JsonValue::from)),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(idx).map(|v| v.map(JsonValue::from))
            }
            "NUMERIC" => row
                .try_get::<Option<Decimal>, _>(idx)
                .map(|v| v.map(|d| JsonValue::String(d.to_string()))),
            other => {
                return Err(StoreError::decode(format!(
                    "unsupported type {other} for column {name}"
                )));
            }
        };

        let value = value.map_err(|e| StoreError::decode(format!("column {name}: {e}")))?;
        out.insert(name.to_string(), value.unwrap_or(JsonValue::Null));
    }

    Ok(out)
}

/// Leading keyword of a statement (`SELECT`, `UPDATE`, ...), for spans and errors.
fn statement_kind(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned());
            StoreError::database(code, db_err.message())
        }
        sqlx::Error::PoolClosed
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Connection(format!("{operation}: {err}")),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::decode(format!("{operation}: {err}")),
        _ => StoreError::Other(format!("sqlx error in {operation}: {err}")),
    }
}
