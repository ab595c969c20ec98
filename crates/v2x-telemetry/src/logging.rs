//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! human-readable or a JSON formatting layer. JSON lines carry the target,
//! thread id, file and line so they can be shipped to a log aggregator as-is.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// Fails if the log level does not parse or a global subscriber is
/// already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(&config.log_level)?;

    match (config.console_output, config.json_logs) {
        (false, _) => tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?,
        (true, true) => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?
        }
        (true, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?
        }
    }

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        level = %config.log_level,
        "Logging initialized"
    );
    Ok(())
}

/// Parse a level or directive string into an `EnvFilter`.
pub(crate) fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Config(e.to_string()))
}

/// Log a pipeline event tagged with the emitting subsystem.
///
/// ```rust,ignore
/// log_event!(info, "tracking", "Tracks updated", frame = 12, tracks = 4);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(subsystem = $subsystem, $($($field)*,)? $msg)
    };
}

/// Log a per-frame event with the standard `step` field.
#[macro_export]
macro_rules! log_frame_event {
    ($level:ident, $subsystem:expr, $msg:expr, $step:expr $(, $($field:tt)*)?) => {
        tracing::$level!(subsystem = $subsystem, step = $step, $($($field)*,)? $msg)
    };
}
