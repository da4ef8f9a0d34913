use std::io;

use thiserror::Error;

/// Result type used across the DECHA core crate.
pub type Result<T> = std::result::Result<T, DechaError>;

/// Canonical error representation shared by all DECHA crates.
#[derive(Debug, Error)]
pub enum DechaError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("deserialization error: {0}")]
    DeserializationError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("general error: {0}")]
    GeneralError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for DechaError {
    fn from(err: serde_json::Error) -> Self {
        DechaError::DeserializationError(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable is missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {value}")]
    InvalidEnvVar { key: String, value: String },

    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: String,
        min: u64,
        max: u64,
        value: u64,
    },

    #[error("no data directory available on this platform")]
    NoDataDir,
}

impl From<ConfigError> for DechaError {
    fn from(value: ConfigError) -> Self {
        DechaError::ConfigError(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_core_errors() {
        let err: DechaError = ConfigError::MissingEnvVar("DECHA_DATA_DIR".into()).into();
        assert!(matches!(err, DechaError::ConfigError(_)));
        assert_eq!(
            err.to_string(),
            "configuration error: required environment variable is missing: DECHA_DATA_DIR"
        );
    }

    #[test]
    fn json_errors_are_deserialization_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: DechaError = err.into();
        assert!(matches!(converted, DechaError::DeserializationError(_)));
    }
}
