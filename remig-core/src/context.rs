//! Conversion context shared by one migration run

use crate::config::RepairConfig;
use crate::gate::ConnectionGate;
use crate::sink::FailureSink;
use std::fmt;
use std::sync::Arc;

/// Process-scoped state for a migration run.
///
/// The repair stage reads the target names and borrows the gate and sink;
/// it never mutates or closes any of them.
#[derive(Clone)]
pub struct ConversionContext {
    config: RepairConfig,
    gate: Arc<dyn ConnectionGate>,
    sink: Arc<dyn FailureSink>,
}

impl ConversionContext {
    pub fn new(
        config: RepairConfig,
        gate: Arc<dyn ConnectionGate>,
        sink: Arc<dyn FailureSink>,
    ) -> Self {
        Self { config, gate, sink }
    }

    pub fn schema(&self) -> &str {
        &self.config.target_schema
    }

    pub fn database(&self) -> &str {
        &self.config.target_database
    }

    pub fn data_type(&self) -> &str {
        &self.config.data_type
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    pub fn gate(&self) -> &dyn ConnectionGate {
        self.gate.as_ref()
    }

    pub fn sink(&self) -> &dyn FailureSink {
        self.sink.as_ref()
    }
}

impl fmt::Debug for ConversionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
