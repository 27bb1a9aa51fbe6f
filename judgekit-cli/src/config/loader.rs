use super::types::{
    DEFAULT_DATABASE_FILE, DEFAULT_EVENTS_FILE, DatabaseConfig, EventsConfig, JudgekitConfig,
    RawDatabaseConfig, RawEventsConfig, RawJudgekitConfig, RawLogConfig, RawTelemetryConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use judgekit_observe::{LogConfig, TelemetryConfig};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + environment)
    pub fn load() -> Result<JudgekitConfig> {
        let mut raw = RawJudgekitConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: Environment
        raw = Self::apply_env(raw, |key| std::env::var(key).ok());

        Ok(Self::finalize(raw, Self::data_dir()))
    }

    /// Load a single config file, applying defaults. Missing files yield defaults.
    pub fn load_from_path(path: &Path) -> Result<JudgekitConfig> {
        let raw = if path.exists() {
            Self::read_raw(path)?
        } else {
            RawJudgekitConfig::default()
        };
        Ok(Self::finalize(raw, None))
    }

    fn read_raw(path: &Path) -> Result<RawJudgekitConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "judgekit").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with JUDGEKIT_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("JUDGEKIT_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".judgekit/config.toml")
        }
    }

    /// Platform data directory holding the database and event log
    fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "judgekit").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawJudgekitConfig, overlay: RawJudgekitConfig) -> RawJudgekitConfig {
        RawJudgekitConfig {
            database: RawDatabaseConfig {
                path: overlay.database.path.or(base.database.path),
            },
            events: RawEventsConfig {
                path: overlay.events.path.or(base.events.path),
            },
            log: RawLogConfig {
                filter: overlay.log.filter.or(base.log.filter),
                json: overlay.log.json.or(base.log.json),
            },
            telemetry: RawTelemetryConfig {
                sentry_dsn: overlay.telemetry.sentry_dsn.or(base.telemetry.sentry_dsn),
                environment: overlay.telemetry.environment.or(base.telemetry.environment),
                traces_sample_rate: overlay
                    .telemetry
                    .traces_sample_rate
                    .or(base.telemetry.traces_sample_rate),
            },
        }
    }

    /// SENTRY_DSN and JUDGEKIT_ENV take precedence over every file
    fn apply_env(
        mut raw: RawJudgekitConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> RawJudgekitConfig {
        if let Some(dsn) = lookup("SENTRY_DSN").filter(|v| !v.is_empty()) {
            raw.telemetry.sentry_dsn = Some(dsn);
        }
        if let Some(env) = lookup("JUDGEKIT_ENV").filter(|v| !v.is_empty()) {
            raw.telemetry.environment = Some(env);
        }
        raw
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawJudgekitConfig, data_dir: Option<PathBuf>) -> JudgekitConfig {
        let in_data_dir = |file: &str| match &data_dir {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        let log_defaults = LogConfig::default();
        let telemetry_defaults = TelemetryConfig::default();

        JudgekitConfig {
            database: DatabaseConfig {
                path: raw
                    .database
                    .path
                    .unwrap_or_else(|| in_data_dir(DEFAULT_DATABASE_FILE)),
            },
            events: EventsConfig {
                path: raw
                    .events
                    .path
                    .unwrap_or_else(|| in_data_dir(DEFAULT_EVENTS_FILE)),
            },
            log: LogConfig {
                filter: raw.log.filter.unwrap_or(log_defaults.filter),
                json: raw.log.json.unwrap_or(log_defaults.json),
            },
            telemetry: TelemetryConfig {
                sentry_dsn: raw.telemetry.sentry_dsn,
                environment: raw
                    .telemetry
                    .environment
                    .unwrap_or(telemetry_defaults.environment),
                traces_sample_rate: raw
                    .telemetry
                    .traces_sample_rate
                    .unwrap_or(telemetry_defaults.traces_sample_rate),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.toml");

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.database.path, PathBuf::from(DEFAULT_DATABASE_FILE));
        assert_eq!(config.events.path, PathBuf::from(DEFAULT_EVENTS_FILE));
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.telemetry.environment, "development");
    }

    #[test]
    fn test_load_from_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            temp_dir.path(),
            r#"
[database]
path = "/tmp/evals.db"

[log]
filter = "judgekit_evals=debug"
json = true

[telemetry]
sentry_dsn = "https://key@sentry.example.com/1"
environment = "production"
traces_sample_rate = 0.25
"#,
        );

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/evals.db"));
        assert_eq!(config.log.filter, "judgekit_evals=debug");
        assert!(config.log.json);
        assert!(config.telemetry.reporting_enabled());
        assert!((config.telemetry.traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "this is not valid toml {{{{");

        let result = ConfigLoader::load_from_path(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_raw_overlay_overrides_base() {
        let base = RawJudgekitConfig {
            database: RawDatabaseConfig {
                path: Some(PathBuf::from("/base.db")),
            },
            log: RawLogConfig {
                filter: Some("warn".to_string()),
                json: Some(true),
            },
            ..Default::default()
        };
        let overlay = RawJudgekitConfig {
            database: RawDatabaseConfig {
                path: Some(PathBuf::from("/overlay.db")),
            },
            log: RawLogConfig {
                filter: None, // Should preserve base value
                json: Some(false),
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.database.path, Some(PathBuf::from("/overlay.db")));
        assert_eq!(merged.log.filter, Some("warn".to_string()));
        assert_eq!(merged.log.json, Some(false));
    }

    #[test]
    fn test_merge_raw_none_preserves_base() {
        let base = RawJudgekitConfig {
            telemetry: RawTelemetryConfig {
                sentry_dsn: Some("dsn".to_string()),
                environment: Some("staging".to_string()),
                traces_sample_rate: Some(0.5),
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge_raw(base, RawJudgekitConfig::default());

        assert_eq!(merged.telemetry.sentry_dsn, Some("dsn".to_string()));
        assert_eq!(merged.telemetry.environment, Some("staging".to_string()));
        assert_eq!(merged.telemetry.traces_sample_rate, Some(0.5));
    }

    #[test]
    fn test_env_overrides_telemetry() {
        let vars: HashMap<&str, &str> = [
            ("SENTRY_DSN", "https://env@sentry.example.com/2"),
            ("JUDGEKIT_ENV", "production"),
        ]
        .into_iter()
        .collect();
        let raw = RawJudgekitConfig {
            telemetry: RawTelemetryConfig {
                environment: Some("development".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let raw = ConfigLoader::apply_env(raw, |key| vars.get(key).map(|v| v.to_string()));
        let config = ConfigLoader::finalize(raw, None);

        assert_eq!(
            config.telemetry.sentry_dsn.as_deref(),
            Some("https://env@sentry.example.com/2")
        );
        assert_eq!(config.telemetry.environment, "production");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let raw = RawJudgekitConfig {
            telemetry: RawTelemetryConfig {
                sentry_dsn: Some("from-file".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let raw = ConfigLoader::apply_env(raw, |_| Some(String::new()));

        assert_eq!(raw.telemetry.sentry_dsn, Some("from-file".to_string()));
        assert!(raw.telemetry.environment.is_none());
    }

    #[test]
    fn test_finalize_places_files_in_data_dir() {
        let config =
            ConfigLoader::finalize(RawJudgekitConfig::default(), Some(PathBuf::from("/data")));

        assert_eq!(config.database.path, PathBuf::from("/data/judgekit.db"));
        assert_eq!(config.events.path, PathBuf::from("/data/events.jsonl"));
    }

    #[test]
    fn test_user_config_path_returns_some() {
        let path = ConfigLoader::user_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("judgekit"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_path() {
        let path = ConfigLoader::project_config_path();
        assert_eq!(path, PathBuf::from(".judgekit/config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_dir_override() {
        let temp_dir = TempDir::new().unwrap();
        write_config(
            temp_dir.path(),
            r#"
[events]
path = "/tmp/project-events.jsonl"
"#,
        );

        unsafe { std::env::set_var("JUDGEKIT_PROJECT_CONFIG_DIR", temp_dir.path()) };
        let path = ConfigLoader::project_config_path();
        let config = ConfigLoader::load();
        unsafe { std::env::remove_var("JUDGEKIT_PROJECT_CONFIG_DIR") };

        assert_eq!(path, temp_dir.path().join("config.toml"));
        assert_eq!(
            config.unwrap().events.path,
            PathBuf::from("/tmp/project-events.jsonl")
        );
    }
}
