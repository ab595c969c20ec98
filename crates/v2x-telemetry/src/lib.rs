//! # V2X Telemetry
//!
//! Observability for the V2X pipeline.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, plain or JSON
//! - **Metrics**: Prometheus counters, gauges and histograms, scraped from
//!   an optional `/metrics` endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use v2x_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `V2X_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `V2X_JSON_LOGS` | `false` | JSON log lines |
//! | `V2X_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `V2X_SERVICE_NAME` | `v2x-pipeline` | Service name in logs |
//! | `V2X_METRICS_PORT` | unset | Port of the Prometheus endpoint |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, DETECTIONS_PRODUCED, FRAMES_PROCESSED,
    FRAME_DURATION, LINKS_ACTIVE, MESSAGES_BROADCAST, STAGE_DURATION, SUBSYSTEM_ERRORS,
    TRACKS_ACTIVE, VEHICLES_ACTIVE,
};

use axum::{http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Metrics endpoint failed: {0}")]
    Endpoint(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Router exposing `/metrics` (Prometheus text) and `/health`.
pub fn metrics_router() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/metrics",
            get(|| async {
                match encode_metrics() {
                    Ok(body) => (StatusCode::OK, body),
                    Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
                }
            }),
        )
}

/// Serve [`metrics_router`] until the listener fails.
pub async fn serve_metrics(port: u16) -> Result<(), TelemetryError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Metrics endpoint listening");
    axum::serve(listener, metrics_router()).await?;
    Ok(())
}

/// Convenience macro for creating a span with subsystem context.
///
/// ```rust,ignore
/// let _span = subsystem_span!("track_frame", subsystem = "tracking", frame = 12).entered();
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_metric_inc_macro() {
        let before = SUBSYSTEM_ERRORS
            .with_label_values(&["tracking", "test"])
            .get();
        metric_inc!(SUBSYSTEM_ERRORS, &["tracking", "test"]);
        let after = SUBSYSTEM_ERRORS
            .with_label_values(&["tracking", "test"])
            .get();
        assert_eq!(after, before + 1.0);
    }

    #[tokio::test]
    async fn test_metrics_router_serves_health() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, metrics_router()).await;
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("ok"));
    }
}
