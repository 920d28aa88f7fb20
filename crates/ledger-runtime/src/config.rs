//! # Ledger Configuration
//!
//! ## Security Requirements
//!
//! - The admin address MUST NOT be the zero address in production
//! - The admin is fixed when the store is created and never changes

use ledger_telemetry::TelemetryConfig;
use shared_types::{Address, AddressParseError, Timestamp};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Sole holder of the Admin role.
    pub admin: Address,
    /// JSON command script replayed by `ledger-node`.
    pub script: Option<PathBuf>,
    /// Starting clock value for deterministic replay. Wall clock when unset.
    pub genesis_time: Option<Timestamp>,
    pub telemetry: TelemetryConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admin: Address::ZERO,
            script: None,
            genesis_time: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AP_ADMIN_ADDRESS is not a valid address ({value}): {source}")]
    InvalidAdmin {
        value: String,
        #[source]
        source: AddressParseError,
    },

    #[error("AP_GENESIS_TIME is not a timestamp: {0}")]
    InvalidGenesisTime(String),

    #[error(
        "SECURITY VIOLATION: admin address is the zero address. \
         Set AP_ADMIN_ADDRESS to the administrator's address."
    )]
    ZeroAdmin,
}

impl LedgerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AP_ADMIN_ADDRESS`: admin address, `0x` + 40 hex chars (default: zero address)
    /// - `AP_SCRIPT`: path of a JSON command script
    /// - `AP_GENESIS_TIME`: starting timestamp in seconds
    /// - telemetry variables, see [`TelemetryConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: TelemetryConfig::for_component("node"),
            ..Self::default()
        };

        if let Ok(value) = env::var("AP_ADMIN_ADDRESS") {
            config.admin = value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidAdmin { value, source })?;
        }
        if let Ok(path) = env::var("AP_SCRIPT") {
            config.script = Some(PathBuf::from(path));
        }
        if let Ok(value) = env::var("AP_GENESIS_TIME") {
            let time = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidGenesisTime(value))?;
            config.genesis_time = Some(time);
        }
        Ok(config)
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if the admin is the zero address.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.admin.is_zero() {
            return Err(ConfigError::ZeroAdmin);
        }
        Ok(())
    }
}
