//! `jobly-core` — storage-agnostic building blocks for the data-access layer.
//!
//! This crate contains the error model, SQL bind values, the partial-update
//! fragment builder and the query-execution boundary. It never talks to a
//! database itself.

pub mod error;
pub mod id;
pub mod sql;
pub mod store;

pub use error::{ModelError, ModelResult, StoreError};
pub use id::JobId;
pub use sql::{ColumnMap, PartialUpdate, SqlValue, sql_for_partial_update};
pub use store::{QueryExecutor, Row, ScriptedExecutor, decode_row};
