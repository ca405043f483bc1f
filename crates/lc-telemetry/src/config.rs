//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name for log records
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or directives
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Deployment identifier (local, test, production)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "level-crossing".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "local".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LC_SERVICE_NAME`: Service name (default: level-crossing)
    /// - `LC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `LC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `LC_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `LC_NETWORK`: Deployment identifier (default: local)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("LC_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("LC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env::var("LC_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.console_output),

            json_logs: env::var("LC_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            network: env::var("LC_NETWORK").unwrap_or(defaults.network),
        }
    }

    /// Configuration for one component of the workspace.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("{}-{}", config.service_name, component);
        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
