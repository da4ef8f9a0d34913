use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::conversion::{split_fields, EARTH_SECONDS_PER_DAY};
use crate::error::TimeError;

/// Standard 24h/60m/60s clock reading.
///
/// Derived from the same wall-clock read as the DECHA snapshot, never from
/// the DECHA value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EarthTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl EarthTime {
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, TimeError> {
        TimeError::check("Earth hours", hours.into(), 23)?;
        TimeError::check("Earth minutes", minutes.into(), 59)?;
        TimeError::check("Earth seconds", seconds.into(), 59)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Splits whole seconds since midnight, wrapping past the end of the day.
    pub fn from_seconds(seconds: u32) -> Self {
        let seconds = seconds % EARTH_SECONDS_PER_DAY;
        Self {
            hours: (seconds / 3_600) as u8,
            minutes: ((seconds % 3_600) / 60) as u8,
            seconds: (seconds % 60) as u8,
        }
    }

    pub fn from_naive_time(time: &NaiveTime) -> Self {
        Self {
            hours: time.hour() as u8,
            minutes: time.minute() as u8,
            seconds: time.second().min(59) as u8,
        }
    }

    pub fn seconds_since_midnight(&self) -> u32 {
        u32::from(self.hours) * 3_600 + u32::from(self.minutes) * 60 + u32::from(self.seconds)
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hours.into(), self.minutes.into(), self.seconds.into())
    }
}

impl fmt::Display for EarthTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

impl FromStr for EarthTime {
    type Err = TimeError;

    /// Parses `HH:MM:SS` or `HH:MM` in 24-hour form.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fields = split_fields(input, 2..=3, "HH:MM[:SS]")?;
        let seconds = fields.get(2).copied().unwrap_or(0);
        TimeError::check("Earth hours", fields[0], 23)?;
        TimeError::check("Earth minutes", fields[1], 59)?;
        TimeError::check("Earth seconds", seconds, 59)?;
        Ok(Self {
            hours: fields[0] as u8,
            minutes: fields[1] as u8,
            seconds: seconds as u8,
        })
    }
}

/// Earth seconds since local midnight, with millisecond precision.
///
/// A leap second reported by the host (nanos >= 1e9) is folded into the
/// last second of the minute.
pub fn earth_seconds_since_midnight(time: &NaiveTime) -> f64 {
    let millis = (time.nanosecond() / 1_000_000).min(999);
    f64::from(time.num_seconds_from_midnight()) + f64::from(millis) / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn splits_whole_seconds() {
        assert_eq!(EarthTime::from_seconds(43_200), EarthTime::new(12, 0, 0).expect("valid"));
        assert_eq!(EarthTime::from_seconds(86_399).to_string(), "23:59:59");
        assert_eq!(EarthTime::from_seconds(86_400), EarthTime::default());
        assert_eq!(EarthTime::from_seconds(3_725).seconds_since_midnight(), 3_725);
    }

    #[test]
    fn reads_naive_time_with_millis() {
        let time = NaiveTime::from_hms_milli_opt(6, 0, 0, 250).expect("time");
        assert_eq!(earth_seconds_since_midnight(&time), 21_600.25);
        assert_eq!(EarthTime::from_naive_time(&time).to_string(), "06:00:00");

        let leap = NaiveTime::from_hms_nano_opt(23, 59, 59, 1_500_000_000).expect("leap second");
        assert!((earth_seconds_since_midnight(&leap) - 86_399.999).abs() < 1e-6);
    }

    #[test]
    fn parses_and_validates() {
        let time: EarthTime = "18:30:05".parse().expect("parse");
        assert_eq!(time, EarthTime { hours: 18, minutes: 30, seconds: 5 });
        assert!("24:00:00".parse::<EarthTime>().is_err());
        assert!("12:60:00".parse::<EarthTime>().is_err());
        assert!("12".parse::<EarthTime>().is_err());
        assert!(EarthTime::new(23, 59, 60).is_err());
        assert_eq!(time.to_naive_time(), NaiveTime::from_hms_opt(18, 30, 5));
    }

    #[test_case("06:00", 6, 0, 0 ; "seconds omitted")]
    #[test_case("6:00:00", 6, 0, 0 ; "single digit hour")]
    #[test_case(" 23:59 ", 23, 59, 0 ; "surrounding whitespace")]
    fn seconds_are_optional(input: &str, hours: u8, minutes: u8, seconds: u8) {
        let time: EarthTime = input.parse().expect("parse");
        assert_eq!(time, EarthTime { hours, minutes, seconds });
    }
}
