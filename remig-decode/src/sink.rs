//! Failure sink backed by `tracing`

use remig_core::FailureSink;

/// Emits every report as an `error` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, message: &str, statement: Option<&str>) {
        match statement {
            Some(sql) => tracing::error!(statement = sql, "{}", message),
            None => tracing::error!("{}", message),
        }
    }
}
