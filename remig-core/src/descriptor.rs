//! Column descriptors and per-task outcomes

use crate::error::RepairError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One (table, column) pair discovered by the catalog scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub table_name: String,
    pub column_name: String,
}

impl ColumnDescriptor {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table_name, self.column_name)
    }
}

/// How a single repair task resolved.
///
/// All three variants count as "resolved" for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The statement ran and committed.
    Succeeded { rows_affected: u64 },
    /// No handle could be acquired; nothing was executed.
    ConnectionFailed(RepairError),
    /// The statement was issued and rejected by the store.
    StatementFailed(RepairError),
}

impl RepairOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The failure payload, if any.
    pub fn error(&self) -> Option<&RepairError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::ConnectionFailed(err) | Self::StatementFailed(err) => Some(err),
        }
    }
}

/// The resolved result of one repair task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub descriptor: ColumnDescriptor,
    pub outcome: RepairOutcome,
}
