//! Tracing Subscriber Initialization
//!
//! Structured logging for the repair binary. The filter comes from
//! `RUST_LOG` when set; output is JSON lines or human-readable text.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{PgError, PgResult};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "remig_decode=info,remig_pg=info,warn";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log line format
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("REMIG_SERVICE_NAME")
                .unwrap_or_else(|_| "remig-decode".to_string()),
            log_format: match std::env::var("REMIG_LOG_FORMAT").as_deref() {
                Ok("pretty") | Ok("text") => LogFormat::Pretty,
                _ => LogFormat::Json,
            },
        }
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup before any events are emitted.
pub fn init_tracing(config: &TelemetryConfig) -> PgResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    result.map_err(|e| PgError::Telemetry(e.to_string()))?;

    tracing::info!(
        service_name = config.service_name,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}
