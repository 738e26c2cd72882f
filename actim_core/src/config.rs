use crate::event_log::MAX_EVENTS;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const DEFAULT_CACHE_TTL_HOURS: i64 = 24;
const DEFAULT_CACHE_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn positive_duration(value: i64, to_duration: fn(i64) -> Option<Duration>) -> Option<Duration> {
    if value <= 0 {
        return None;
    }
    to_duration(value)
}

/// Runtime settings; every field has a default so a partial file is enough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted key-value files
    pub data_dir: PathBuf,

    /// Optional TOML catalog of modules and pathways
    pub catalog: Option<PathBuf>,

    pub max_analytics_events: usize,

    /// How long a cached payload stays fresh
    pub cache_ttl_hours: i64,

    /// How long cached payloads survive housekeeping
    pub cache_retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".actim"),
            catalog: None,
            max_analytics_events: MAX_EVENTS,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            cache_retention_days: DEFAULT_CACHE_RETENTION_DAYS,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject durations that are not positive or do not fit a time span
    pub fn validate(&self) -> Result<(), ConfigError> {
        if positive_duration(self.cache_ttl_hours, Duration::try_hours).is_none() {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_hours",
                reason: format!("{} is not a usable number of hours", self.cache_ttl_hours),
            });
        }
        if positive_duration(self.cache_retention_days, Duration::try_days).is_none() {
            return Err(ConfigError::Invalid {
                field: "cache_retention_days",
                reason: format!("{} is not a usable number of days", self.cache_retention_days),
            });
        }
        Ok(())
    }

    /// Cache freshness window; an unusable value falls back to the default
    pub fn cache_ttl(&self) -> Duration {
        positive_duration(self.cache_ttl_hours, Duration::try_hours).unwrap_or_else(|| {
            warn!(value = self.cache_ttl_hours, "Invalid cache_ttl_hours, using default");
            Duration::hours(DEFAULT_CACHE_TTL_HOURS)
        })
    }

    /// Cache retention window; an unusable value falls back to the default
    pub fn cache_retention(&self) -> Duration {
        positive_duration(self.cache_retention_days, Duration::try_days).unwrap_or_else(|| {
            warn!(value = self.cache_retention_days, "Invalid cache_retention_days, using default");
            Duration::days(DEFAULT_CACHE_RETENTION_DAYS)
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
data_dir = "/tmp/actim"
max_analytics_events = 50
"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/actim"));
        assert_eq!(config.max_analytics_events, 50);
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.cache_retention_days, 7);
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::from_toml_str("max_analytics_events = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        let err = Config::from_toml_str("cache_ttl_hours = 9223372036854775807").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cache_ttl_hours", .. }));

        let err = Config::from_toml_str("cache_retention_days = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cache_retention_days", .. }));

        let err = Config::from_toml_str("cache_ttl_hours = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_unusable_durations_fall_back_to_defaults() {
        let config = Config {
            cache_ttl_hours: i64::MAX,
            cache_retention_days: -3,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl(), Duration::hours(24));
        assert_eq!(config.cache_retention(), Duration::days(7));

        let config = Config {
            cache_ttl_hours: 2,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl(), Duration::hours(2));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
