//! remig Decode - Binary Column Remediation
//!
//! After a bulk load, `bytea` columns may still hold the hex text their
//! bytes were transported as. This crate finds those columns and rewrites
//! each one in place, all columns concurrently, without letting one
//! column's failure stop the others.
//!
//! The stage is best-effort: [`decode_binary_data`] always resolves with
//! the context it was given. Failures only surface through the context's
//! [`FailureSink`](remig_core::FailureSink).

pub mod decoder;
pub mod dispatcher;
pub mod metrics;
pub mod scanner;
pub mod sink;
pub mod stream;
pub mod task;

// Re-export commonly used types
pub use decoder::{decode_binary_data, BinaryDataDecoder};
pub use dispatcher::ParallelRepairDispatcher;
pub use metrics::{RepairMetrics, RepairMetricsSnapshot};
pub use scanner::ColumnCatalogScanner;
pub use sink::TracingFailureSink;
pub use stream::{ByteaRepairStream, DecodeStream, GeometryDecodeStream};
pub use task::ColumnRepairTask;
