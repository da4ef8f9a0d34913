use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conversion::DechaFields;

/// Coarse part of the DECHA day, keyed on the hour alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Night,
    Dawn,
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 6] = [
        DayPeriod::Night,
        DayPeriod::Dawn,
        DayPeriod::Morning,
        DayPeriod::Midday,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Night => "night",
            DayPeriod::Dawn => "dawn",
            DayPeriod::Morning => "morning",
            DayPeriod::Midday => "midday",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
        }
    }

    /// Human readable caption shown next to the clock.
    pub fn description(&self) -> &'static str {
        match self {
            DayPeriod::Night => "Deep Night • Rest & Renewal",
            DayPeriod::Dawn => "Early Dawn • New Beginnings",
            DayPeriod::Morning => "Morning Rise • Peak Energy",
            DayPeriod::Midday => "Midday Peak • Maximum Focus",
            DayPeriod::Afternoon => "Afternoon Flow • Sustained Work",
            DayPeriod::Evening => "Evening Wind • Reflection Time",
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a DECHA reading by hour. Hours past 9 read as night.
pub fn get_day_period(time: &impl DechaFields) -> DayPeriod {
    match time.hours() {
        0 => DayPeriod::Night,
        1 => DayPeriod::Dawn,
        2 | 3 => DayPeriod::Morning,
        4 => DayPeriod::Midday,
        5 | 6 => DayPeriod::Afternoon,
        7 | 8 => DayPeriod::Evening,
        _ => DayPeriod::Night,
    }
}
