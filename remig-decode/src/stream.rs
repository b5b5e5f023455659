//! Decode streams run by the module entry point.
//!
//! Each stream handles one binary encoding family. Streams never fail;
//! everything they hit goes to the context's failure sink.

use crate::dispatcher::ParallelRepairDispatcher;
use crate::metrics::RepairMetrics;
use crate::scanner::ColumnCatalogScanner;
use ::async_trait::async_trait;
use remig_core::ConversionContext;
use std::sync::Arc;

/// One family of binary data to decode after a load.
#[async_trait]
pub trait DecodeStream: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &ConversionContext);
}

/// Scan-then-dispatch over hex-transported `bytea` columns.
#[derive(Debug, Clone, Default)]
pub struct ByteaRepairStream {
    metrics: Arc<RepairMetrics>,
}

impl ByteaRepairStream {
    pub fn new(metrics: Arc<RepairMetrics>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &Arc<RepairMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl DecodeStream for ByteaRepairStream {
    fn name(&self) -> &'static str {
        "bytea"
    }

    async fn run(&self, ctx: &ConversionContext) {
        tracing::info!(
            database = ctx.database(),
            schema = ctx.schema(),
            "Decoding binary data in bytea columns from its textual representation"
        );

        let columns = ColumnCatalogScanner::new(ctx)
            .with_metrics(&self.metrics)
            .scan()
            .await;

        ParallelRepairDispatcher::new(ctx)
            .with_metrics(&self.metrics)
            .run(columns)
            .await;
    }
}

/// Placeholder for geometry columns.
///
/// Resolves immediately without touching the store. A geometry decoder
/// would implement [`DecodeStream`] and be plugged into
/// [`BinaryDataDecoder::with_streams`](crate::BinaryDataDecoder::with_streams)
/// in place of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryDecodeStream;

#[async_trait]
impl DecodeStream for GeometryDecodeStream {
    fn name(&self) -> &'static str {
        "geometry"
    }

    async fn run(&self, ctx: &ConversionContext) {
        tracing::debug!(schema = ctx.schema(), "Geometry decoding not implemented, skipping");
    }
}
