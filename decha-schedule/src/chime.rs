use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use decha_time::{ClockSnapshot, DechaFields};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::notification::Notification;

/// How often the top-of-hour chime sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChimeFrequency {
    #[default]
    #[serde(rename = "every-hour")]
    EveryHour,
    #[serde(rename = "every-2-hours")]
    EveryTwoHours,
    #[serde(rename = "every-3-hours")]
    EveryThreeHours,
}

impl ChimeFrequency {
    pub fn step(&self) -> u8 {
        match self {
            ChimeFrequency::EveryHour => 1,
            ChimeFrequency::EveryTwoHours => 2,
            ChimeFrequency::EveryThreeHours => 3,
        }
    }

    pub fn includes(&self, hour: u8) -> bool {
        hour % self.step() == 0
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChimeFrequency::EveryHour => "every-hour",
            ChimeFrequency::EveryTwoHours => "every-2-hours",
            ChimeFrequency::EveryThreeHours => "every-3-hours",
        }
    }
}

impl fmt::Display for ChimeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChimeFrequency {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "every-hour" | "1" => Ok(ChimeFrequency::EveryHour),
            "every-2-hours" | "2" => Ok(ChimeFrequency::EveryTwoHours),
            "every-3-hours" | "3" => Ok(ChimeFrequency::EveryThreeHours),
            other => Err(ScheduleError::InvalidSetting(format!(
                "unknown chime frequency `{other}`"
            ))),
        }
    }
}

/// Remembers the last DECHA hour that chimed so each hour chimes once.
#[derive(Debug, Clone, Default)]
pub struct HourlyChime {
    last: Option<(NaiveDate, u8)>,
}

impl HourlyChime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chime for `snapshot` if one is due at `H:00:00`.
    pub fn poll(
        &mut self,
        frequency: ChimeFrequency,
        sound: bool,
        snapshot: &ClockSnapshot,
    ) -> Option<Notification> {
        let time = &snapshot.decha;
        if time.minutes() != 0 || time.seconds() != 0 {
            return None;
        }
        let hour = time.hours();
        if !frequency.includes(hour) {
            return None;
        }
        let key = (snapshot.date, hour);
        if self.last == Some(key) {
            return None;
        }
        self.last = Some(key);
        Some(Notification::hourly(hour, time.day_period(), sound))
    }
}
