//! Module entry point for the binary decode stage.

use crate::metrics::RepairMetrics;
use crate::stream::{ByteaRepairStream, DecodeStream, GeometryDecodeStream};
use futures_util::future::join;
use remig_core::ConversionContext;
use std::sync::Arc;

/// Runs the bytea repair stream next to the geometry stream.
pub struct BinaryDataDecoder {
    metrics: Arc<RepairMetrics>,
    bytea: Box<dyn DecodeStream>,
    geometry: Box<dyn DecodeStream>,
}

impl Default for BinaryDataDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryDataDecoder {
    pub fn new() -> Self {
        let metrics = Arc::new(RepairMetrics::new());
        Self {
            bytea: Box::new(ByteaRepairStream::new(Arc::clone(&metrics))),
            geometry: Box::new(GeometryDecodeStream),
            metrics,
        }
    }

    /// Swap in different streams, e.g. a real geometry decoder.
    pub fn with_streams(bytea: Box<dyn DecodeStream>, geometry: Box<dyn DecodeStream>) -> Self {
        Self {
            metrics: Arc::new(RepairMetrics::new()),
            bytea,
            geometry,
        }
    }

    /// Metrics of the default bytea stream. Streams passed to
    /// [`with_streams`](Self::with_streams) keep their own.
    pub fn metrics(&self) -> &Arc<RepairMetrics> {
        &self.metrics
    }

    /// Run both streams concurrently and hand the context back once both
    /// have finished, whatever happened inside them.
    pub async fn run(&self, ctx: ConversionContext) -> ConversionContext {
        join(self.bytea.run(&ctx), self.geometry.run(&ctx)).await;

        tracing::debug!(
            streams = ?[self.bytea.name(), self.geometry.name()],
            "Binary data decoding finished"
        );
        ctx
    }
}

/// Decode binary data from its textual representation with the default
/// streams.
pub async fn decode_binary_data(ctx: ConversionContext) -> ConversionContext {
    BinaryDataDecoder::new().run(ctx).await
}
