//! Projection of Earth times of day onto other IANA timezones.

use std::fmt;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::earth::EarthTime;
use crate::error::TimeError;

/// Entry of the picker offered by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub offset: &'static str,
}

const POPULAR_TIMEZONES: &[TimezoneInfo] = &[
    TimezoneInfo { name: "America/New_York", label: "New York (EST/EDT)", offset: "UTC-5/-4" },
    TimezoneInfo { name: "America/Chicago", label: "Chicago (CST/CDT)", offset: "UTC-6/-5" },
    TimezoneInfo { name: "America/Denver", label: "Denver (MST/MDT)", offset: "UTC-7/-6" },
    TimezoneInfo { name: "America/Los_Angeles", label: "Los Angeles (PST/PDT)", offset: "UTC-8/-7" },
    TimezoneInfo { name: "Europe/London", label: "London (GMT/BST)", offset: "UTC+0/+1" },
    TimezoneInfo { name: "Europe/Paris", label: "Paris (CET/CEST)", offset: "UTC+1/+2" },
    TimezoneInfo { name: "Europe/Moscow", label: "Moscow (MSK)", offset: "UTC+3" },
    TimezoneInfo { name: "Asia/Dubai", label: "Dubai (GST)", offset: "UTC+4" },
    TimezoneInfo { name: "Asia/Kolkata", label: "India (IST)", offset: "UTC+5:30" },
    TimezoneInfo { name: "Asia/Shanghai", label: "Shanghai (CST)", offset: "UTC+8" },
    TimezoneInfo { name: "Asia/Tokyo", label: "Tokyo (JST)", offset: "UTC+9" },
    TimezoneInfo { name: "Australia/Sydney", label: "Sydney (AEDT/AEST)", offset: "UTC+10/+11" },
    TimezoneInfo { name: "Pacific/Auckland", label: "Auckland (NZDT/NZST)", offset: "UTC+12/+13" },
];

pub fn popular_timezones() -> &'static [TimezoneInfo] {
    POPULAR_TIMEZONES
}

/// Parses an IANA label such as `Europe/Paris`.
pub fn parse_timezone(label: &str) -> Result<Tz, TimeError> {
    label
        .trim()
        .parse::<Tz>()
        .map_err(|_| TimeError::UnknownTimezone(label.to_string()))
}

/// Re-expresses Earth times read in a `source` zone in other zones.
#[derive(Debug, Clone)]
pub struct TimezoneProjector<S: TimeZone> {
    source: S,
}

impl<S> TimezoneProjector<S>
where
    S: TimeZone + fmt::Debug,
{
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves `earth` on `date` in the source zone to an instant.
    ///
    /// Ambiguous local times (clocks turned back) resolve to the earlier
    /// instant. Times skipped by a forward transition are an error.
    pub fn resolve(&self, date: NaiveDate, earth: &EarthTime) -> Result<DateTime<Utc>, TimeError> {
        let time = earth.to_naive_time().ok_or_else(|| TimeError::OutOfRange {
            field: "Earth hours",
            value: earth.hours.into(),
            max: 23,
        })?;
        let naive = NaiveDateTime::new(date, time);
        match self.source.from_local_datetime(&naive) {
            LocalResult::Single(instant) => Ok(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => {
                debug!(%naive, "ambiguous local time, using the earlier instant");
                Ok(earliest.with_timezone(&Utc))
            }
            LocalResult::None => Err(TimeError::NonexistentLocalTime {
                date: date.to_string(),
                time: earth.to_string(),
                timezone: format!("{:?}", self.source),
            }),
        }
    }

    /// Earth time of day in `target` at the moment `earth` is read in the source zone.
    pub fn project(
        &self,
        date: NaiveDate,
        earth: &EarthTime,
        target: Tz,
    ) -> Result<EarthTime, TimeError> {
        let instant = self.resolve(date, earth)?;
        Ok(project_instant(&instant, target))
    }

    /// Same as [`Self::project`], formatted `HH:MM:SS` on a 24-hour clock.
    pub fn format(&self, date: NaiveDate, earth: &EarthTime, target: Tz) -> Result<String, TimeError> {
        self.project(date, earth, target).map(|time| time.to_string())
    }
}

/// Earth time of day of `instant` seen from `target`.
pub fn project_instant<T: TimeZone>(instant: &DateTime<T>, target: Tz) -> EarthTime {
    EarthTime::from_naive_time(&instant.with_timezone(&target).time())
}

/// Short zone name in effect at `instant`, e.g. `EST` or `+0530`.
pub fn abbreviation<T: TimeZone>(instant: &DateTime<T>, target: Tz) -> String {
    instant.with_timezone(&target).format("%Z").to_string()
}

/// UTC offset in effect at `instant`, e.g. `+05:30`.
pub fn utc_offset<T: TimeZone>(instant: &DateTime<T>, target: Tz) -> String {
    instant.with_timezone(&target).format("%:z").to_string()
}
