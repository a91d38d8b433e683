//! Infrastructure layer: the Postgres executor and its configuration.

pub mod config;
pub mod postgres;

pub use config::{ConfigError, DbConfig};
pub use postgres::PgExecutor;
