use std::path::PathBuf;

use decha_core::DechaError;
use decha_time::TimeError;
use thiserror::Error;

/// Errors returned by the alarm, settings and calendar stores.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("alarm not found: {0}")]
    AlarmNotFound(String),
    #[error("calendar event not found: {0}")]
    EventNotFound(String),
    #[error("invalid alarm: {0}")]
    InvalidAlarm(String),
    #[error("invalid calendar event: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error("import path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("duplicate identifier detected: {id}")]
    DuplicateRecord { id: String },
    #[error("storage failure: {0}")]
    Storage(#[from] DechaError),
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

impl ScheduleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScheduleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ScheduleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }
}
