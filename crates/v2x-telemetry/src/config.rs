//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive.
    pub log_level: String,

    /// Whether to write logs to stdout at all.
    pub console_output: bool,

    /// JSON formatted logs instead of the human-readable format.
    pub json_logs: bool,

    /// Port of the Prometheus endpoint; 0 disables it.
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "v2x-pipeline".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 0,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `V2X_SERVICE_NAME`: Service name (default: v2x-pipeline)
    /// - `V2X_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `V2X_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `V2X_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `V2X_METRICS_PORT`: Prometheus endpoint port (default: disabled)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("V2X_SERVICE_NAME")
                .unwrap_or_else(|_| "v2x-pipeline".to_string()),

            log_level: env::var("V2X_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("V2X_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("V2X_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            metrics_port: env::var("V2X_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Builder-style method to set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Builder-style method to toggle JSON output.
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Whether the metrics endpoint should be started.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port != 0
    }
}

/// Parse a boolean-ish env value; anything unrecognised yields `default`.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
