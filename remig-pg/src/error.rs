//! Error Types for remig PG
//!
//! Bootstrap failures surface as [`PgError`]. Failures while a round is
//! running are translated into [`StoreError`] and never leave the round.

use remig_core::{ConfigError, StoreError};
use thiserror::Error;

/// Errors that stop the process before a repair round starts.
#[derive(Debug, Error)]
pub enum PgError {
    #[error("Failed to create pool: {0}")]
    Pool(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to init tracing: {0}")]
    Telemetry(String),
}

/// Result type alias for adapter bootstrap.
pub type PgResult<T> = Result<T, PgError>;

/// Translate a pool checkout failure.
pub fn pool_error(err: deadpool_postgres::PoolError) -> StoreError {
    match err {
        deadpool_postgres::PoolError::Timeout(_) => {
            StoreError::acquire("Timed out waiting for a database connection")
        }
        deadpool_postgres::PoolError::Closed => {
            StoreError::acquire("Database connection pool is closed")
        }
        other => StoreError::acquire(other.to_string()),
    }
}

/// Translate a query failure, preferring the server's own message.
pub fn query_error(err: tokio_postgres::Error) -> StoreError {
    match err.as_db_error() {
        Some(db) => StoreError::query(format!("{}: {}", db.code().code(), db.message())),
        None => StoreError::query(err.to_string()),
    }
}
