use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimeError;
use crate::period::{get_day_period, DayPeriod};

pub const EARTH_SECONDS_PER_DAY: u32 = 86_400;
pub const DECHA_SECONDS_PER_DAY: u32 = 100_000;
/// Length of one DECHA second in Earth seconds (86 400 / 100 000).
pub const EARTH_SECONDS_PER_DECHA_SECOND: f64 =
    EARTH_SECONDS_PER_DAY as f64 / DECHA_SECONDS_PER_DAY as f64;

pub const MAX_DECHA_HOUR: u32 = 9;
pub const MAX_DECHA_MINUTE: u32 = 99;
pub const MAX_DECHA_SECOND: u32 = 99;

/// Read access to the hour/minute/second fields of any DECHA reading.
pub trait DechaFields {
    fn hours(&self) -> u8;
    fn minutes(&self) -> u8;
    fn seconds(&self) -> u8;

    /// Flattened within-day second count, `H*10000 + M*100 + S`.
    fn total_seconds(&self) -> u32 {
        u32::from(self.hours()) * 10_000 + u32::from(self.minutes()) * 100 + u32::from(self.seconds())
    }
}

/// Snapshot of the DECHA clock, recomputed on every tick.
///
/// `hours`, `minutes` and `seconds` are always the decomposition of
/// `total_seconds`. `percentage` keeps the sub-second precision of the
/// original division so progress indicators move between whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DechaTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub total_seconds: u32,
    pub percentage: f64,
}

impl DechaTime {
    /// Midnight, the start of the DECHA day.
    pub const MIDNIGHT: DechaTime = DechaTime {
        hours: 0,
        minutes: 0,
        seconds: 0,
        total_seconds: 0,
        percentage: 0.0,
    };

    /// Hour/minute/second part without the fractional percentage.
    pub fn clock(&self) -> DechaClock {
        DechaClock {
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        }
    }

    /// Minute-granularity part, as used by quiet hours.
    pub fn hour_minute(&self) -> DechaHourMinute {
        DechaHourMinute {
            hours: self.hours,
            minutes: self.minutes,
        }
    }

    pub fn day_period(&self) -> DayPeriod {
        get_day_period(self)
    }

    /// Progress through the current DECHA hour, in percent.
    pub fn hour_progress(&self) -> f64 {
        calculate_progress(f64::from(self.minutes), 100.0)
    }

    /// Progress through the current DECHA minute, in percent.
    pub fn minute_progress(&self) -> f64 {
        calculate_progress(f64::from(self.seconds), 100.0)
    }
}

impl DechaFields for DechaTime {
    fn hours(&self) -> u8 {
        self.hours
    }

    fn minutes(&self) -> u8 {
        self.minutes
    }

    fn seconds(&self) -> u8 {
        self.seconds
    }

    fn total_seconds(&self) -> u32 {
        self.total_seconds
    }
}

impl fmt::Display for DechaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.clock().fmt(f)
    }
}

/// A DECHA time of day at second granularity, e.g. an alarm target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DechaClock {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl DechaClock {
    /// Validated constructor for user-entered values.
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, TimeError> {
        TimeError::check("DECHA hours", hours.into(), MAX_DECHA_HOUR)?;
        TimeError::check("DECHA minutes", minutes.into(), MAX_DECHA_MINUTE)?;
        TimeError::check("DECHA seconds", seconds.into(), MAX_DECHA_SECOND)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Decomposes a flattened second count, wrapping past the end of the day.
    pub fn from_total_seconds(total: u32) -> Self {
        let total = total % DECHA_SECONDS_PER_DAY;
        Self {
            hours: (total / 10_000) as u8,
            minutes: ((total % 10_000) / 100) as u8,
            seconds: (total % 100) as u8,
        }
    }

    pub fn is_valid(&self) -> bool {
        u32::from(self.hours) <= MAX_DECHA_HOUR
            && u32::from(self.minutes) <= MAX_DECHA_MINUTE
            && u32::from(self.seconds) <= MAX_DECHA_SECOND
    }

    pub fn to_earth_seconds(&self) -> u32 {
        decha_to_earth_seconds(self)
    }
}

impl DechaFields for DechaClock {
    fn hours(&self) -> u8 {
        self.hours
    }

    fn minutes(&self) -> u8 {
        self.minutes
    }

    fn seconds(&self) -> u8 {
        self.seconds
    }
}

impl fmt::Display for DechaClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl FromStr for DechaClock {
    type Err = TimeError;

    /// Parses `H:MM:SS` or `H:MM`; missing seconds read as zero.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fields = split_fields(input, 2..=3, "H:MM[:SS]")?;
        let narrow = |value: u32, field: &'static str, max: u32| -> Result<u8, TimeError> {
            TimeError::check(field, value, max)?;
            Ok(value as u8)
        };
        Ok(Self {
            hours: narrow(fields[0], "DECHA hours", MAX_DECHA_HOUR)?,
            minutes: narrow(fields[1], "DECHA minutes", MAX_DECHA_MINUTE)?,
            seconds: narrow(fields.get(2).copied().unwrap_or(0), "DECHA seconds", MAX_DECHA_SECOND)?,
        })
    }
}

/// A DECHA time of day at minute granularity (quiet hours, calendar starts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DechaHourMinute {
    pub hours: u8,
    pub minutes: u8,
}

impl DechaHourMinute {
    pub fn new(hours: u8, minutes: u8) -> Result<Self, TimeError> {
        TimeError::check("DECHA hours", hours.into(), MAX_DECHA_HOUR)?;
        TimeError::check("DECHA minutes", minutes.into(), MAX_DECHA_MINUTE)?;
        Ok(Self { hours, minutes })
    }

    /// Minutes since midnight in base 100: `H*100 + M`.
    pub fn flat(&self) -> u32 {
        u32::from(self.hours) * 100 + u32::from(self.minutes)
    }

    pub fn from_flat(flat: u32) -> Self {
        let flat = flat % 1_000;
        Self {
            hours: (flat / 100) as u8,
            minutes: (flat % 100) as u8,
        }
    }
}

impl fmt::Display for DechaHourMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.hours, self.minutes)
    }
}

impl FromStr for DechaHourMinute {
    type Err = TimeError;

    /// Parses `H:MM`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fields = split_fields(input, 2..=2, "H:MM")?;
        TimeError::check("DECHA hours", fields[0], MAX_DECHA_HOUR)?;
        TimeError::check("DECHA minutes", fields[1], MAX_DECHA_MINUTE)?;
        Ok(Self {
            hours: fields[0] as u8,
            minutes: fields[1] as u8,
        })
    }
}

impl From<DechaClock> for DechaHourMinute {
    fn from(value: DechaClock) -> Self {
        Self {
            hours: value.hours,
            minutes: value.minutes,
        }
    }
}

impl From<&DechaTime> for DechaHourMinute {
    fn from(value: &DechaTime) -> Self {
        value.hour_minute()
    }
}

/// Converts Earth seconds since local midnight into the DECHA clock.
///
/// Valid input is `0 <= earth_seconds < 86400`. Anything else is wrapped
/// into the day (non-finite values read as midnight) rather than rejected.
pub fn earth_seconds_to_decha_time(earth_seconds: f64) -> DechaTime {
    let day = f64::from(EARTH_SECONDS_PER_DAY);
    let earth_seconds = if earth_seconds.is_finite() {
        earth_seconds.rem_euclid(day)
    } else {
        0.0
    };

    let precise = earth_seconds / EARTH_SECONDS_PER_DECHA_SECOND;
    // rem_euclid may round up to exactly one day for tiny negative inputs.
    let total_seconds = (precise.floor() as u32).min(DECHA_SECONDS_PER_DAY - 1);
    let clock = DechaClock::from_total_seconds(total_seconds);

    DechaTime {
        hours: clock.hours,
        minutes: clock.minutes,
        seconds: clock.seconds,
        total_seconds,
        percentage: precise / f64::from(DECHA_SECONDS_PER_DAY) * 100.0,
    }
}

/// Converts a DECHA reading into whole Earth seconds since midnight.
///
/// Both directions floor independently, so a round trip through
/// [`earth_seconds_to_decha_time`] does not always reproduce its input.
pub fn decha_to_earth_seconds(time: &impl DechaFields) -> u32 {
    (f64::from(time.total_seconds()) * EARTH_SECONDS_PER_DECHA_SECOND).floor() as u32
}

/// Percentage of `current` over `max`.
pub fn calculate_progress(current: f64, max: f64) -> f64 {
    if max == 0.0 {
        return 0.0;
    }
    current / max * 100.0
}

/// Splits `input` on `:` into between `counts.start()` and `counts.end()`
/// numeric fields.
pub(crate) fn split_fields(
    input: &str,
    counts: RangeInclusive<usize>,
    expected: &'static str,
) -> Result<Vec<u32>, TimeError> {
    let fields: Vec<u32> = input
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| TimeError::malformed(input, expected))?;
    if !counts.contains(&fields.len()) {
        return Err(TimeError::malformed(input, expected));
    }
    Ok(fields)
}
