//! DECHA: a decimal clock of 10 hours, 100 minutes and 100 seconds per day.
//!
//! # Architecture
//!
//! The workspace is split into the following crates:
//!
//! * `decha-core`: errors, configuration, logging and key-value persistence
//! * `decha-time`: Earth/DECHA conversion, day periods, quiet hours and timezone projection
//! * `decha-schedule`: alarms, settings, calendar events and the polling loop
//! * `decha-cli`: the `decha` command-line front end
//!
//! This crate re-exports the library crates under one name.

pub use decha_core as core;
pub use decha_schedule as schedule;
pub use decha_time as time;

pub use decha_schedule::{Alarm, AlarmMatcher, AlarmPoller, AlarmRepeat, AlarmStore, SettingsStore};
pub use decha_time::{
    decha_to_earth_seconds, earth_seconds_to_decha_time, get_day_period, is_quiet_hours,
    DayPeriod, DechaClock, DechaTime, QuietHoursConfig, TimezoneProjector,
};
