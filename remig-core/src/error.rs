//! Error types for remig operations

use thiserror::Error;

/// Errors raised by a connection gate or a query handle.
///
/// These are the raw collaborator failures; the scanner and the repair task
/// translate them into [`RepairError`] before reporting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Cannot acquire connection: {reason}")]
    Acquire { reason: String },

    #[error("Query failed: {reason}")]
    Query { reason: String },
}

impl StoreError {
    pub fn acquire(reason: impl Into<String>) -> Self {
        Self::Acquire {
            reason: reason.into(),
        }
    }

    pub fn query(reason: impl Into<String>) -> Self {
        Self::Query {
            reason: reason.into(),
        }
    }

    /// The collaborator's own description of the failure.
    pub fn reason(&self) -> &str {
        match self {
            Self::Acquire { reason } | Self::Query { reason } => reason,
        }
    }
}

/// Failures of a single unit of repair work.
///
/// Each variant is terminal only for the scan or task that raised it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepairError {
    #[error("Cannot connect to the metadata catalog: {reason}")]
    CatalogUnavailable { reason: String },

    #[error("Catalog query failed: {reason}")]
    CatalogQueryFailed { reason: String },

    #[error("Cannot connect to repair {table}.{column}: {reason}")]
    ConnectionUnavailable {
        table: String,
        column: String,
        reason: String,
    },

    #[error("Repair statement failed for {table}.{column}: {reason}")]
    StatementFailed {
        table: String,
        column: String,
        reason: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Errors from decoding hexadecimal text.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum HexDecodeError {
    #[error("invalid hexadecimal data: odd number of digits")]
    OddNumberOfDigits,

    #[error("invalid hexadecimal digit: {found:?} at offset {offset}")]
    InvalidDigit { found: char, offset: usize },
}

/// Master error type for all remig errors.
#[derive(Debug, Clone, Error)]
pub enum RemigError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Repair error: {0}")]
    Repair(#[from] RepairError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] HexDecodeError),
}

/// Result type alias for remig operations.
pub type RemigResult<T> = Result<T, RemigError>;

// =============================================================================
// TESTS
// =============================================================================
