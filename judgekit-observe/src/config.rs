//! Configuration types for logging and telemetry.

use serde::{Deserialize, Serialize};

/// Environment name in which error reporting is switched on.
pub const PRODUCTION: &str = "production";

/// Console logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit one JSON object per line instead of compact text.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Error reporting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Sentry DSN. Reporting stays off without one.
    pub sentry_dsn: Option<String>,
    /// Deployment environment, e.g. `development` or `production`.
    pub environment: String,
    /// Fraction of transactions sent to Sentry.
    pub traces_sample_rate: f32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sentry_dsn: None,
            environment: "development".to_string(),
            traces_sample_rate: 1.0,
        }
    }
}

impl TelemetryConfig {
    /// Whether events should be sent to Sentry.
    #[must_use]
    pub fn reporting_enabled(&self) -> bool {
        self.environment == PRODUCTION && self.sentry_dsn.as_deref().is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_quiet() {
        let log = LogConfig::default();
        assert_eq!(log.filter, "info");
        assert!(!log.json);

        let telemetry = TelemetryConfig::default();
        assert_eq!(telemetry.environment, "development");
        assert!((telemetry.traces_sample_rate - 1.0).abs() < f32::EPSILON);
        assert!(!telemetry.reporting_enabled());
    }

    #[test]
    fn reporting_needs_production_and_dsn() {
        let mut config = TelemetryConfig {
            sentry_dsn: Some("https://key@sentry.example.com/1".into()),
            ..Default::default()
        };
        assert!(!config.reporting_enabled());

        config.environment = PRODUCTION.to_string();
        assert!(config.reporting_enabled());

        config.sentry_dsn = Some(String::new());
        assert!(!config.reporting_enabled());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: TelemetryConfig = toml::from_str("environment = \"production\"").unwrap();
        assert_eq!(config.environment, "production");
        assert!(config.sentry_dsn.is_none());
        assert!((config.traces_sample_rate - 1.0).abs() < f32::EPSILON);
    }
}
