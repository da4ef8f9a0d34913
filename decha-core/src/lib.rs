//! Core shared library for the DECHA clock.
//!
//! This crate exposes reusable primitives that the time, schedule and CLI
//! crates depend on: common errors, configuration loading, logging setup,
//! JSON helpers and the key-value persistence used for alarms, settings
//! and calendar events.

pub mod config;
pub mod errors;
pub mod kv;
pub mod logging;
pub mod serde_utils;

pub use config::{load_core_config, DechaConfig, Environment};
pub use errors::{ConfigError, DechaError, Result as CoreResult};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
