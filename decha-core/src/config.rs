use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ConfigError, DechaError};

/// Default polling period of the watch loop. Must stay below one DECHA
/// second (864 ms) for alarms to be observed on their exact second.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
pub const MIN_POLL_INTERVAL_MS: u64 = 50;
pub const MAX_POLL_INTERVAL_MS: u64 = 5_000;

/// Earth duration of one DECHA second.
pub const DECHA_SECOND: Duration = Duration::from_millis(864);

/// Whether polling every `period` can step over a DECHA second entirely.
pub fn may_skip_seconds(period: Duration) -> bool {
    period > DECHA_SECOND
}

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Process configuration shared by the DECHA binaries.
#[derive(Debug, Clone)]
pub struct DechaConfig {
    pub environment: Environment,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub log_level: String,
}

impl DechaConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("DECHA_")
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `DECHA_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let environment = lookup(&key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();

        let data_dir = match lookup(&key("DATA_DIR")) {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };

        let poll_key = key("POLL_INTERVAL_MS");
        let poll_ms = match lookup(&poll_key) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnvVar {
                    key: poll_key.clone(),
                    value: raw.clone(),
                })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&poll_ms) {
            return Err(ConfigError::OutOfRange {
                key: poll_key,
                min: MIN_POLL_INTERVAL_MS,
                max: MAX_POLL_INTERVAL_MS,
                value: poll_ms,
            });
        }

        let log_level = lookup(&key("LOG")).unwrap_or_else(|| "info".to_string());

        Ok(Self {
            environment,
            data_dir,
            poll_interval: Duration::from_millis(poll_ms),
            log_level,
        })
    }

    /// Directory holding the JSON key-value files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Whether the process is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    /// Whether the poll interval can miss a DECHA second.
    pub fn may_skip_seconds(&self) -> bool {
        may_skip_seconds(self.poll_interval)
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("decha"))
        .ok_or(ConfigError::NoDataDir)
}

/// Helper that loads config and converts to the canonical DECHA error type.
pub fn load_core_config() -> Result<DechaConfig, DechaError> {
    Ok(DechaConfig::from_env()?)
}
