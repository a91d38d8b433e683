//! Error model for the data-access layer.

use thiserror::Error;

/// Result type used by every model operation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Model-level error.
///
/// Only two failures originate in this layer: a caller handing over nothing
/// to update, and a key that does not match any row. Everything the store
/// reports is passed through untouched in [`ModelError::Store`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The caller supplied malformed or empty input (e.g. no update fields).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced primary key does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Failure reported by the underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ModelError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Store operation error.
///
/// Produced by [`QueryExecutor`](crate::QueryExecutor) implementations. The
/// SQLSTATE code of database errors is kept so callers can tell constraint
/// violations apart without parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The database rejected the statement.
    #[error("database error{}: {message}", code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Database {
        code: Option<String>,
        message: String,
    },

    /// The store could not be reached (pool closed, I/O, TLS, timeouts).
    #[error("connection error: {0}")]
    Connection(String),

    /// A result row could not be turned into the expected record.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn database(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Database {
            code,
            message: message.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// SQLSTATE code, when the store reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code() == Some("23505")
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.code() == Some("23503")
    }
}
