use judgekit_observe::{LogConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the database inside the data directory
pub const DEFAULT_DATABASE_FILE: &str = "judgekit.db";

/// File name of the event log inside the data directory
pub const DEFAULT_EVENTS_FILE: &str = "events.jsonl";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawJudgekitConfig {
    #[serde(default)]
    pub database: RawDatabaseConfig,

    #[serde(default)]
    pub events: RawEventsConfig,

    #[serde(default)]
    pub log: RawLogConfig,

    #[serde(default)]
    pub telemetry: RawTelemetryConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDatabaseConfig {
    /// Path of the SQLite database file
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEventsConfig {
    /// Path of the JSON-lines event log
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLogConfig {
    pub filter: Option<String>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTelemetryConfig {
    pub sentry_dsn: Option<String>,
    pub environment: Option<String>,
    pub traces_sample_rate: Option<f32>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JudgekitConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    pub path: PathBuf,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_EVENTS_FILE),
        }
    }
}
