//! Counters for repair rounds.
//!
//! These counters track repair activity across rounds and can be logged or
//! scraped by whatever embeds the decoder.

use remig_core::{RepairOutcome, TaskReport};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for repair rounds.
#[derive(Debug, Default)]
pub struct RepairMetrics {
    /// Scan-then-dispatch rounds completed
    pub rounds: AtomicU64,

    /// Columns returned by catalog scans
    pub columns_discovered: AtomicU64,

    /// Columns whose repair statement committed
    pub columns_repaired: AtomicU64,

    /// Rows rewritten by committed statements
    pub rows_affected: AtomicU64,

    /// Tasks that could not acquire a handle
    pub connection_failures: AtomicU64,

    /// Tasks whose statement was rejected
    pub statement_failures: AtomicU64,

    /// Catalog scans that failed
    pub catalog_failures: AtomicU64,
}

impl RepairMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_report(&self, report: &TaskReport) {
        match &report.outcome {
            RepairOutcome::Succeeded { rows_affected } => {
                self.columns_repaired.fetch_add(1, Ordering::Relaxed);
                self.rows_affected.fetch_add(*rows_affected, Ordering::Relaxed);
            }
            RepairOutcome::ConnectionFailed(_) => {
                self.connection_failures.fetch_add(1, Ordering::Relaxed);
            }
            RepairOutcome::StatementFailed(_) => {
                self.statement_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> RepairMetricsSnapshot {
        RepairMetricsSnapshot {
            rounds: self.rounds.load(Ordering::Relaxed),
            columns_discovered: self.columns_discovered.load(Ordering::Relaxed),
            columns_repaired: self.columns_repaired.load(Ordering::Relaxed),
            rows_affected: self.rows_affected.load(Ordering::Relaxed),
            connection_failures: self.connection_failures.load(Ordering::Relaxed),
            statement_failures: self.statement_failures.load(Ordering::Relaxed),
            catalog_failures: self.catalog_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of repair metrics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairMetricsSnapshot {
    pub rounds: u64,
    pub columns_discovered: u64,
    pub columns_repaired: u64,
    pub rows_affected: u64,
    pub connection_failures: u64,
    pub statement_failures: u64,
    pub catalog_failures: u64,
}

impl RepairMetricsSnapshot {
    pub fn failed_columns(&self) -> u64 {
        self.connection_failures + self.statement_failures
    }
}
