//! Catalog scan for columns needing repair.

use crate::metrics::RepairMetrics;
use remig_core::{catalog_query, ColumnDescriptor, ConversionContext, RepairError};
use std::sync::atomic::Ordering;

/// Finds every column of the configured binary type in the target schema.
pub struct ColumnCatalogScanner<'a> {
    ctx: &'a ConversionContext,
    metrics: Option<&'a RepairMetrics>,
}

impl<'a> ColumnCatalogScanner<'a> {
    pub fn new(ctx: &'a ConversionContext) -> Self {
        Self { ctx, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: &'a RepairMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run the catalog query once and return the matching columns.
    ///
    /// A failure is reported to the context's sink and yields an empty
    /// list, so the round proceeds with nothing to do.
    pub async fn scan(&self) -> Vec<ColumnDescriptor> {
        let query = catalog_query(self.ctx.database(), self.ctx.schema(), self.ctx.data_type());

        let result = async {
            let mut handle = self.ctx.gate().acquire().await.map_err(|e| {
                RepairError::CatalogUnavailable {
                    reason: e.reason().to_string(),
                }
            })?;

            handle
                .query_catalog(&query)
                .await
                .map_err(|e| RepairError::CatalogQueryFailed {
                    reason: e.reason().to_string(),
                })
        }
        .await;

        match result {
            Ok(columns) => {
                if let Some(metrics) = self.metrics {
                    metrics
                        .columns_discovered
                        .fetch_add(columns.len() as u64, Ordering::Relaxed);
                }
                tracing::debug!(
                    database = self.ctx.database(),
                    schema = self.ctx.schema(),
                    data_type = self.ctx.data_type(),
                    columns = columns.len(),
                    "Catalog scan completed"
                );
                columns
            }
            Err(err) => {
                if let Some(metrics) = self.metrics {
                    metrics.catalog_failures.fetch_add(1, Ordering::Relaxed);
                }
                let statement = match err {
                    RepairError::CatalogQueryFailed { .. } => Some(query.sql()),
                    _ => None,
                };
                self.ctx.sink().report(&err.to_string(), statement);
                Vec::new()
            }
        }
    }
}
