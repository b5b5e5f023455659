//! Repair stage configuration
//!
//! Loaded from environment variables with defaults for everything except
//! the target database, which has no sensible default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default schema searched for binary columns.
pub const DEFAULT_TARGET_SCHEMA: &str = "public";

/// Declared data type of the columns under repair.
pub const DEFAULT_BINARY_DATA_TYPE: &str = "bytea";

/// Which catalog slice the repair round covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Schema holding the migrated tables.
    pub target_schema: String,
    /// Database (catalog) holding the migrated tables.
    pub target_database: String,
    /// `information_schema.columns.data_type` value to match.
    pub data_type: String,
}

impl RepairConfig {
    pub fn new(target_database: impl Into<String>, target_schema: impl Into<String>) -> Self {
        Self {
            target_schema: target_schema.into(),
            target_database: target_database.into(),
            data_type: DEFAULT_BINARY_DATA_TYPE.to_string(),
        }
    }

    /// Create RepairConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `REMIG_TARGET_DATABASE`: Target database name (required)
    /// - `REMIG_TARGET_SCHEMA`: Target schema name (default: public)
    /// - `REMIG_BINARY_DATA_TYPE`: Column data type to repair (default: bytea)
    pub fn from_env() -> Result<Self, ConfigError> {
        let target_database =
            std::env::var("REMIG_TARGET_DATABASE").map_err(|_| ConfigError::MissingRequired {
                field: "REMIG_TARGET_DATABASE".to_string(),
            })?;

        let target_schema = std::env::var("REMIG_TARGET_SCHEMA")
            .unwrap_or_else(|_| DEFAULT_TARGET_SCHEMA.to_string());

        let data_type = std::env::var("REMIG_BINARY_DATA_TYPE")
            .unwrap_or_else(|_| DEFAULT_BINARY_DATA_TYPE.to_string());

        let config = Self {
            target_schema,
            target_database,
            data_type,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject empty names. No other validation is done.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("target_schema", &self.target_schema),
            ("target_database", &self.target_database),
            ("data_type", &self.data_type),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
