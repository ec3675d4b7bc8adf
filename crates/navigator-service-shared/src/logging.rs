//! Structured logging for the compliance service.
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: `json` (default) or `text` (alias `pretty`)
//! - `RUST_LOG`: filter directives (default: `info`)
//! - `SERVICE_NAME`: recorded on the startup event

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event (production).
    #[default]
    Json,
    /// Multi-line human-readable output (development).
    Text,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    /// Unrecognized values fall back to JSON.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            _ => LogFormat::Json,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    pub service: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            service: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            format: lookup("LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.format),
            level: lookup("RUST_LOG").unwrap_or(defaults.level),
            service: lookup("SERVICE_NAME"),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

/// Install the global subscriber. Call once at startup; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Text => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            service = config.service.as_deref().unwrap_or("navigator"),
            format = ?config.format,
            "logging initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("TEXT".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("yaml".parse::<LogFormat>(), Ok(LogFormat::Json));
    }

    #[test]
    fn reads_lookup_values() {
        let config = LoggingConfig::from_lookup(|key| match key {
            "LOG_FORMAT" => Some("text".to_string()),
            "SERVICE_NAME" => Some("compliance".to_string()),
            _ => None,
        });
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.level, "info");
        assert_eq!(config.service.as_deref(), Some("compliance"));
    }

    #[test]
    fn with_service_overrides_name() {
        let config = LoggingConfig::default().with_service("compliance");
        assert_eq!(config.service.as_deref(), Some("compliance"));
    }
}
