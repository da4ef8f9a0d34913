use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc, Weekday};
use decha_time::{DechaClock, DechaFields};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScheduleError;

/// Opaque alarm identifier. New alarms receive a random UUID, imported ones
/// keep whatever string they were exported with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(String);

impl AlarmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlarmId {
    fn from(value: &str) -> Self {
        AlarmId::new(value)
    }
}

impl From<String> for AlarmId {
    fn from(value: String) -> Self {
        AlarmId::new(value)
    }
}

/// Which days an alarm is allowed to fire on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmRepeat {
    #[default]
    Once,
    Daily,
    Weekdays,
    Weekends,
    Custom,
}

impl AlarmRepeat {
    pub const ALL: [AlarmRepeat; 5] = [
        AlarmRepeat::Once,
        AlarmRepeat::Daily,
        AlarmRepeat::Weekdays,
        AlarmRepeat::Weekends,
        AlarmRepeat::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmRepeat::Once => "once",
            AlarmRepeat::Daily => "daily",
            AlarmRepeat::Weekdays => "weekdays",
            AlarmRepeat::Weekends => "weekends",
            AlarmRepeat::Custom => "custom",
        }
    }
}

impl fmt::Display for AlarmRepeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlarmRepeat {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AlarmRepeat::ALL
            .into_iter()
            .find(|repeat| repeat.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ScheduleError::InvalidAlarm(format!("unknown repeat rule `{value}`")))
    }
}

/// Weekday index with Sunday as 0.
pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

/// Persisted alarm. Field names follow the exported JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: AlarmId,
    pub decha_time: DechaClock,
    #[serde(default)]
    pub label: String,
    #[serde(default = "Alarm::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub repeat: AlarmRepeat,
    /// Weekday indices (Sunday = 0). Only consulted for [`AlarmRepeat::Custom`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_days: Vec<u8>,
    #[serde(default = "Alarm::default_sound")]
    pub sound: bool,
    #[serde(default)]
    pub snooze_count: u32,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_triggered: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Alarm {
    pub fn default_enabled() -> bool {
        true
    }

    pub fn default_sound() -> bool {
        true
    }

    /// Builds an enabled alarm from form input.
    pub fn new(draft: AlarmDraft, created_at: DateTime<Utc>) -> Result<Self, ScheduleError> {
        let alarm = Alarm {
            id: AlarmId::generate(),
            decha_time: draft.decha_time,
            label: draft.label,
            enabled: true,
            repeat: draft.repeat,
            custom_days: normalize_days(draft.custom_days),
            sound: draft.sound,
            snooze_count: 0,
            last_triggered: None,
            created_at,
        };
        alarm.validate()?;
        Ok(alarm)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !self.decha_time.is_valid() {
            return Err(ScheduleError::InvalidAlarm(format!(
                "{}: trigger time {} is outside the DECHA day",
                self.id, self.decha_time
            )));
        }
        if let Some(day) = self.custom_days.iter().find(|day| **day > 6) {
            return Err(ScheduleError::InvalidAlarm(format!(
                "{}: custom day {day} is not a weekday index (0-6)",
                self.id
            )));
        }
        if self.repeat == AlarmRepeat::Custom && self.custom_days.is_empty() {
            return Err(ScheduleError::InvalidAlarm(format!(
                "{}: custom repeat needs at least one day",
                self.id
            )));
        }
        Ok(())
    }

    /// Flattened trigger time, used for ordering.
    pub fn trigger_seconds(&self) -> u32 {
        self.decha_time.total_seconds()
    }

    pub fn runs_on(&self, day: u8) -> bool {
        self.custom_days.contains(&day)
    }

    pub fn apply(&mut self, update: AlarmUpdate) -> Result<(), ScheduleError> {
        let mut next = self.clone();
        if let Some(label) = update.label {
            next.label = label;
        }
        if let Some(time) = update.decha_time {
            next.decha_time = time;
        }
        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(repeat) = update.repeat {
            next.repeat = repeat;
        }
        if let Some(days) = update.custom_days {
            next.custom_days = normalize_days(days);
        }
        if let Some(sound) = update.sound {
            next.sound = sound;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn normalize_days(days: Vec<u8>) -> Vec<u8> {
    days.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Form input for a new alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDraft {
    pub decha_time: DechaClock,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub repeat: AlarmRepeat,
    #[serde(default)]
    pub custom_days: Vec<u8>,
    #[serde(default = "Alarm::default_sound")]
    pub sound: bool,
}

impl AlarmDraft {
    pub fn new(decha_time: DechaClock, label: impl Into<String>) -> Self {
        Self {
            decha_time,
            label: label.into(),
            repeat: AlarmRepeat::Once,
            custom_days: Vec::new(),
            sound: true,
        }
    }

    pub fn repeat(mut self, repeat: AlarmRepeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn custom_days(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.repeat = AlarmRepeat::Custom;
        self.custom_days = days.into_iter().collect();
        self
    }

    pub fn sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }
}

/// Partial edit of an existing alarm. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlarmUpdate {
    pub label: Option<String>,
    pub decha_time: Option<DechaClock>,
    pub enabled: Option<bool>,
    pub repeat: Option<AlarmRepeat>,
    pub custom_days: Option<Vec<u8>>,
    pub sound: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn created() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_717_200_000_000).single().expect("timestamp")
    }

    #[test]
    fn new_alarm_is_enabled_and_untriggered() {
        let draft = AlarmDraft::new(DechaClock { hours: 2, minutes: 50, seconds: 0 }, "Wake");
        let alarm = Alarm::new(draft, created()).expect("alarm");
        assert!(alarm.enabled);
        assert!(alarm.last_triggered.is_none());
        assert_eq!(alarm.trigger_seconds(), 25_000);
        assert!(!alarm.id.as_str().is_empty());
    }

    #[test]
    fn rejects_bad_custom_days() {
        let time = DechaClock { hours: 1, minutes: 0, seconds: 0 };
        let out_of_range = AlarmDraft::new(time, "x").custom_days([1, 7]);
        assert!(matches!(
            Alarm::new(out_of_range, created()),
            Err(ScheduleError::InvalidAlarm(_))
        ));

        let empty = AlarmDraft::new(time, "x").custom_days(Vec::<u8>::new());
        assert!(Alarm::new(empty, created()).is_err());
    }

    #[test]
    fn custom_days_are_sorted_and_unique() {
        let draft = AlarmDraft::new(DechaClock::default(), "gym").custom_days([5, 1, 3, 1]);
        let alarm = Alarm::new(draft, created()).expect("alarm");
        assert_eq!(alarm.custom_days, vec![1, 3, 5]);
        assert!(alarm.runs_on(3));
        assert!(!alarm.runs_on(0));
    }

    #[test]
    fn rejects_invalid_trigger_time() {
        let mut alarm = Alarm::new(AlarmDraft::new(DechaClock::default(), "x"), created())
            .expect("alarm");
        let update = AlarmUpdate {
            decha_time: Some(DechaClock { hours: 10, minutes: 0, seconds: 0 }),
            ..AlarmUpdate::default()
        };
        assert!(alarm.apply(update).is_err());
        assert_eq!(alarm.decha_time, DechaClock::default(), "failed edit leaves alarm unchanged");
    }

    #[test]
    fn reads_exported_json() {
        let raw = json!({
            "id": "1717200000000",
            "dechaTime": {"hours": 7, "minutes": 5, "seconds": 30},
            "label": "Tea",
            "enabled": true,
            "repeat": "custom",
            "customDays": [1, 3],
            "sound": false,
            "snoozeCount": 0,
            "lastTriggered": 1717286400000i64,
            "createdAt": 1717200000000i64
        });
        let alarm: Alarm = serde_json::from_value(raw).expect("alarm");
        assert_eq!(alarm.id.as_str(), "1717200000000");
        assert_eq!(alarm.repeat, AlarmRepeat::Custom);
        assert_eq!(
            alarm.last_triggered.map(|at| at.timestamp_millis()),
            Some(1_717_286_400_000)
        );

        let written = serde_json::to_value(&alarm).expect("serialize");
        assert_eq!(written["dechaTime"]["minutes"], 5);
        assert_eq!(written["createdAt"], 1_717_200_000_000i64);
    }

    #[test]
    fn parses_repeat_names() {
        assert_eq!("Weekends".parse::<AlarmRepeat>().expect("repeat"), AlarmRepeat::Weekends);
        assert!("fortnightly".parse::<AlarmRepeat>().is_err());
        assert_eq!(weekday_index(Weekday::Sun), 0);
        assert_eq!(weekday_index(Weekday::Sat), 6);
    }
}
