//! Fan-out of repair tasks.
//!
//! All tasks of a round are polled concurrently on the calling task: there
//! is no concurrency cap and no ordering between columns. Connection-pool
//! sizing is the only throttle.

use crate::metrics::RepairMetrics;
use crate::task::ColumnRepairTask;
use futures_util::future::join_all;
use remig_core::{ColumnDescriptor, ConversionContext, TaskReport};
use std::sync::atomic::Ordering;
use tracing::Instrument;

/// Runs one [`ColumnRepairTask`] per descriptor and waits for all of them.
pub struct ParallelRepairDispatcher<'a> {
    ctx: &'a ConversionContext,
    metrics: Option<&'a RepairMetrics>,
}

impl<'a> ParallelRepairDispatcher<'a> {
    pub fn new(ctx: &'a ConversionContext) -> Self {
        Self { ctx, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: &'a RepairMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve once every task has resolved. Never fails.
    pub async fn run(&self, descriptors: Vec<ColumnDescriptor>) {
        self.run_with_reports(descriptors).await;
    }

    /// Same as [`run`](Self::run), returning each task's report in the
    /// order the descriptors were given.
    pub async fn run_with_reports(&self, descriptors: Vec<ColumnDescriptor>) -> Vec<TaskReport> {
        let launched = descriptors.len();

        let tasks = descriptors.into_iter().map(|descriptor| {
            let span = tracing::debug_span!(
                "repair_column",
                table = %descriptor.table_name,
                column = %descriptor.column_name
            );
            ColumnRepairTask::new(self.ctx, descriptor)
                .run()
                .instrument(span)
        });
        let reports = join_all(tasks).await;

        let failed = reports.iter().filter(|r| !r.outcome.is_success()).count();
        if let Some(metrics) = self.metrics {
            for report in &reports {
                metrics.record_report(report);
            }
            metrics.rounds.fetch_add(1, Ordering::Relaxed);
        }

        if failed > 0 {
            tracing::warn!(
                schema = self.ctx.schema(),
                launched,
                failed,
                "Repair round completed with failures"
            );
        } else {
            tracing::info!(schema = self.ctx.schema(), launched, "Repair round completed");
        }

        reports
    }
}
