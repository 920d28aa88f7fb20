//! # Ledger Telemetry
//!
//! Structured logging for the provenance ledger, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(TelemetryConfig::for_component("node"))?;
//!     ledger_telemetry::log_event!(info, "runtime", "ledger started");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AP_SERVICE_NAME` | `agri-provenance` | Service name in logs |
//! | `AP_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `AP_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `AP_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |

mod config;
mod logging;
mod subscriber;

pub use config::TelemetryConfig;
pub use subscriber::init_subscriber;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Installs the global subscriber and logs the effective configuration.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    init_subscriber(&config)?;
    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        log_level = %config.log_level,
        "Telemetry initialized"
    );
    Ok(())
}
