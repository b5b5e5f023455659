//! remig Decode Entry Point
//!
//! Bootstraps configuration and tracing, builds the PostgreSQL connection
//! gate, and runs one binary decode round against the target schema.

use std::sync::Arc;

use remig_core::{ConversionContext, RepairConfig};
use remig_decode::{BinaryDataDecoder, TracingFailureSink};
use remig_pg::{init_tracing, DbConfig, PgGate, PgResult, TelemetryConfig};

#[tokio::main]
async fn main() -> PgResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let repair_config = RepairConfig::from_env()?;
    let db_config = DbConfig::from_env(&repair_config);
    let gate = PgGate::from_config(&db_config)?;

    tracing::info!(
        host = %db_config.host,
        dbname = %db_config.dbname,
        schema = %repair_config.target_schema,
        pool_size = db_config.max_size,
        "Starting binary decode stage"
    );

    let ctx = ConversionContext::new(repair_config, Arc::new(gate), Arc::new(TracingFailureSink));
    let decoder = BinaryDataDecoder::new();
    decoder.run(ctx).await;

    let snapshot = decoder.metrics().snapshot();
    tracing::info!(
        columns_discovered = snapshot.columns_discovered,
        columns_repaired = snapshot.columns_repaired,
        rows_affected = snapshot.rows_affected,
        failed_columns = snapshot.failed_columns(),
        catalog_failures = snapshot.catalog_failures,
        "Binary decode stage completed"
    );

    Ok(())
}
