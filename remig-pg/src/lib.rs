//! remig PG - PostgreSQL Adapter
//!
//! Implements the remig connection gate on top of a deadpool-postgres pool
//! and carries the process bootstrap (configuration, tracing) for the
//! `remig-decode` binary.

pub mod db;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use db::{DbConfig, PgGate};
pub use error::{PgError, PgResult};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
