//! Logging initialization
//!
//! Installs a JSON structured-logging subscriber filtered by `RUST_LOG`
//! (falling back to [`DEFAULT_LOG_FILTER`]). Population stages log with
//! `tracing` fields such as `cluster` and `zone`, which end up as JSON keys.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,stratum_common=debug,stratum_cluster=debug";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed
    #[error("invalid log filter {filter:?}: {message}")]
    InvalidFilter {
        /// The rejected directive string
        filter: String,
        /// Parser message
        message: String,
    },

    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line (e.g., "stratum")
    pub service_name: String,

    /// Explicit filter directives; `None` reads `RUST_LOG`, falling back to
    /// [`DEFAULT_LOG_FILTER`]
    pub filter: Option<String>,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "stratum".to_string(),
            filter: None,
            json: true,
        }
    }
}

impl TelemetryConfig {
    /// Build the env filter for this configuration
    ///
    /// Explicit directives must parse. Without them, an unset or unparsable
    /// `RUST_LOG` falls back to [`DEFAULT_LOG_FILTER`].
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        match self.filter.as_deref() {
            Some(directives) => parse_filter(directives),
            None => EnvFilter::try_from_default_env()
                .or_else(|_| parse_filter(DEFAULT_LOG_FILTER)),
        }
    }
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|e| TelemetryError::InvalidFilter {
        filter: directives.to_string(),
        message: e.to_string(),
    })
}

/// Initialize logging with the given configuration
///
/// Returns `SubscriberInit` if a global subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter()?;

    let (json_layer, text_layer) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        (Some(layer), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_target(false)))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_defers_to_environment() {
        let config = TelemetryConfig::default();
        assert_eq!(config.filter, None);
        assert_eq!(config.service_name, "stratum");
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn default_filter_parses() {
        assert!(parse_filter(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = TelemetryConfig {
            filter: Some("stratum=notalevel".to_string()),
            ..Default::default()
        };
        match config.env_filter() {
            Err(TelemetryError::InvalidFilter { filter, .. }) => {
                assert_eq!(filter, "stratum=notalevel")
            }
            other => panic!("Expected InvalidFilter, got {other:?}"),
        }
    }

    #[test]
    fn second_init_fails() {
        let config = TelemetryConfig {
            filter: Some("warn".to_string()),
            ..Default::default()
        };
        let first = init_telemetry(config.clone());
        assert!(
            matches!(first, Ok(()) | Err(TelemetryError::SubscriberInit(_))),
            "first init failed for an unexpected reason: {first:?}"
        );
        assert!(matches!(
            init_telemetry(config),
            Err(TelemetryError::SubscriberInit(_))
        ));
    }
}
