//! Repair of a single column.

use remig_core::{
    repair_statement, ColumnDescriptor, ConversionContext, RepairError, RepairOutcome,
    RepairStatement, TaskReport,
};

/// Rewrites one column in place with one statement.
pub struct ColumnRepairTask<'a> {
    ctx: &'a ConversionContext,
    descriptor: ColumnDescriptor,
}

impl<'a> ColumnRepairTask<'a> {
    pub fn new(ctx: &'a ConversionContext, descriptor: ColumnDescriptor) -> Self {
        Self { ctx, descriptor }
    }

    /// Acquire a handle, execute the repair statement, release the handle.
    ///
    /// Always resolves. A failure is reported to the sink once and carried
    /// in the returned outcome; nothing is retried.
    pub async fn run(self) -> TaskReport {
        let statement = repair_statement(self.ctx.schema(), &self.descriptor);
        let outcome = self.execute(&statement).await;

        match &outcome {
            RepairOutcome::Succeeded { rows_affected } => {
                tracing::debug!(
                    table = %self.descriptor.table_name,
                    column = %self.descriptor.column_name,
                    rows_affected,
                    "Column decoded"
                );
            }
            RepairOutcome::ConnectionFailed(err) => {
                self.ctx.sink().report(&err.to_string(), None);
            }
            RepairOutcome::StatementFailed(err) => {
                self.ctx.sink().report(&err.to_string(), Some(statement.sql()));
            }
        }

        TaskReport {
            descriptor: self.descriptor,
            outcome,
        }
    }

    async fn execute(&self, statement: &RepairStatement) -> RepairOutcome {
        let mut handle = match self.ctx.gate().acquire().await {
            Ok(handle) => handle,
            Err(e) => {
                return RepairOutcome::ConnectionFailed(RepairError::ConnectionUnavailable {
                    table: self.descriptor.table_name.clone(),
                    column: self.descriptor.column_name.clone(),
                    reason: e.reason().to_string(),
                });
            }
        };

        // `handle` drops at the end of this scope on both arms.
        match handle.execute(statement).await {
            Ok(rows_affected) => RepairOutcome::Succeeded { rows_affected },
            Err(e) => RepairOutcome::StatementFailed(RepairError::StatementFailed {
                table: self.descriptor.table_name.clone(),
                column: self.descriptor.column_name.clone(),
                reason: e.reason().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remig_test_utils::{fixtures, RecordingSink};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_task_decodes_deadbeef() {
        let store = fixtures::deadbeef_store();
        let sink = Arc::new(RecordingSink::new());
        let ctx = fixtures::context(&store, &sink, fixtures::TEST_SCHEMA);

        let report = ColumnRepairTask::new(&ctx, ColumnDescriptor::new("t1", "col"))
            .run()
            .await;

        assert_eq!(report.outcome, RepairOutcome::Succeeded { rows_affected: 1 });
        assert_eq!(
            store.column(fixtures::TEST_SCHEMA, "t1", "col"),
            Some(vec![Some(vec![0xDE, 0xAD, 0xBE, 0xEF])])
        );
        assert_eq!(sink.count(), 0);
        assert_eq!(store.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_task_connection_failure_reports_without_statement() {
        let store = fixtures::deadbeef_store();
        store.close();
        let sink = Arc::new(RecordingSink::new());
        let ctx = fixtures::context(&store, &sink, fixtures::TEST_SCHEMA);

        let report = ColumnRepairTask::new(&ctx, ColumnDescriptor::new("t1", "col"))
            .run()
            .await;

        assert!(matches!(
            report.outcome,
            RepairOutcome::ConnectionFailed(RepairError::ConnectionUnavailable { .. })
        ));
        assert!(store.statements().is_empty());
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].statement, None);
    }

    #[tokio::test]
    async fn test_task_statement_failure_reports_statement_and_releases() {
        let store = fixtures::deadbeef_store();
        store.fail_statement_on("t1", "could not obtain lock on relation \"t1\"");
        let sink = Arc::new(RecordingSink::new());
        let ctx = fixtures::context(&store, &sink, fixtures::TEST_SCHEMA);

        let report = ColumnRepairTask::new(&ctx, ColumnDescriptor::new("t1", "col"))
            .run()
            .await;

        assert!(matches!(
            report.outcome,
            RepairOutcome::StatementFailed(RepairError::StatementFailed { .. })
        ));
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("could not obtain lock"));
        assert_eq!(
            reports[0].statement.as_deref(),
            Some("UPDATE migr.t1 SET col = DECODE(ENCODE(col, 'escape'), 'hex');")
        );
        assert_eq!(store.acquired(), 1);
        assert_eq!(store.released(), 1);
        assert_eq!(
            store.column(fixtures::TEST_SCHEMA, "t1", "col"),
            Some(vec![Some(b"deadbeef".to_vec())])
        );
    }

    #[tokio::test]
    async fn test_task_leaves_null_rows_null() {
        let store = fixtures::deadbeef_store();
        store.set_column(
            fixtures::TEST_SCHEMA,
            "t1",
            "col",
            vec![None, Some(b"00".to_vec())],
        );
        let sink = Arc::new(RecordingSink::new());
        let ctx = fixtures::context(&store, &sink, fixtures::TEST_SCHEMA);

        let report = ColumnRepairTask::new(&ctx, ColumnDescriptor::new("t1", "col"))
            .run()
            .await;

        assert_eq!(report.outcome, RepairOutcome::Succeeded { rows_affected: 2 });
        assert_eq!(
            store.column(fixtures::TEST_SCHEMA, "t1", "col"),
            Some(vec![None, Some(vec![0x00])])
        );
    }
}
