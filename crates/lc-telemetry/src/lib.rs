//! # LC Telemetry
//!
//! Structured logging for the level crossing workspace, built on
//! `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     // Spans and events from every crate are now emitted
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LC_SERVICE_NAME` | `level-crossing` | Service name in log records |
//! | `LC_LOG_LEVEL` or `RUST_LOG` | `info` | Log level filter |
//! | `LC_JSON_LOGS` | `false` | JSON instead of pretty output |
//! | `LC_NETWORK` | `local` | Deployment identifier |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{init_test_logging, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Installs the global subscriber described by `config`.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let tracing = tracing_setup::init_tracing(config)?;
    Ok(TelemetryGuard { _tracing: tracing })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
