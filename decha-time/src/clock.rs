use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Weekday};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::conversion::{earth_seconds_to_decha_time, DechaTime};
use crate::earth::{earth_seconds_since_midnight, EarthTime};

/// Source of wall-clock readings.
pub trait Clock: Send + Sync {
    /// Current instant, carrying the local UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;

    fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::at(&self.now())
    }
}

/// Host clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(&now.offset().fix())
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new<Tz: TimeZone>(instant: DateTime<Tz>) -> Self {
        Self {
            instant: Mutex::new(fix(&instant)),
        }
    }

    pub fn set<Tz: TimeZone>(&self, instant: DateTime<Tz>) {
        *self.instant.lock() = fix(&instant);
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock();
        *instant += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.instant.lock()
    }
}

/// Both clocks read from a single wall-clock instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub instant: DateTime<FixedOffset>,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub earth: EarthTime,
    pub decha: DechaTime,
}

impl ClockSnapshot {
    /// Reads the local time of day of `instant` in its own offset.
    pub fn at<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        let instant = fix(instant);
        let local = instant.naive_local();
        let time = local.time();
        Self {
            instant,
            date: local.date(),
            weekday: local.weekday(),
            earth: EarthTime::from_naive_time(&time),
            decha: earth_seconds_to_decha_time(earth_seconds_since_midnight(&time)),
        }
    }

    /// Day of week with Sunday as 0.
    pub fn weekday_index(&self) -> u8 {
        self.weekday.num_days_from_sunday() as u8
    }
}

fn fix<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<FixedOffset> {
    let offset = instant.offset().fix();
    instant.with_timezone(&offset)
}
