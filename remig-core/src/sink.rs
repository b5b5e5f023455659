//! Failure reporting seam

/// Receives failure descriptions from the scanner and the repair tasks.
///
/// Implementations must not panic; there is no way to report a failure of
/// the sink itself.
pub trait FailureSink: Send + Sync {
    fn report(&self, message: &str, statement: Option<&str>);
}

/// Sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FailureSink for NullSink {
    fn report(&self, _message: &str, _statement: Option<&str>) {}
}
