//! Alarm scheduling for the DECHA clock.
//!
//! Alarms are stored as DECHA trigger times with a repeat rule. The
//! [`AlarmMatcher`] decides, for one DECHA second, which alarms fire. The
//! [`AlarmPoller`] reads the wall clock, applies quiet hours from the
//! [`SettingsStore`], records triggers and hands notifications to a
//! [`NotificationSink`]. Calendar events and the hourly chime live here too.

mod alarm;
mod calendar;
mod chime;
mod error;
mod loader;
mod matcher;
mod notification;
mod outcome;
mod persist;
mod poller;
mod settings;
mod store;

pub use alarm::{weekday_index, Alarm, AlarmDraft, AlarmId, AlarmRepeat, AlarmUpdate};
pub use calendar::{
    CalendarEvent, CalendarStore, EventCategory, EventDraft, EventRepeat, EventUpdate,
    DECHA_MINUTES_PER_DAY,
};
pub use chime::{ChimeFrequency, HourlyChime};
pub use error::ScheduleError;
pub use loader::{load_alarms, load_events, parse_records, Keyed};
pub use matcher::{evaluate_alarm, should_trigger, AlarmMatcher};
pub use notification::{ChannelSink, LogSink, Notification, NotificationSink, HOURLY_TAG};
pub use outcome::{TickOutcome, TriggerDecision};
pub use poller::AlarmPoller;
pub use settings::{DisplayFormat, Settings, SettingsStore, Theme};
pub use store::AlarmStore;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use decha_time::{ClockSnapshot, DechaClock};

    #[test]
    fn store_matcher_round() {
        let store = AlarmStore::new();
        store
            .add(
                AlarmDraft::new(DechaClock { hours: 5, minutes: 0, seconds: 0 }, "noon")
                    .repeat(AlarmRepeat::Weekends),
                Utc::now(),
            )
            .expect("add");

        // 2024-06-01 is a Saturday, 2024-06-03 a Monday.
        let saturday = DateTime::parse_from_rfc3339("2024-06-01T12:00:00+00:00").expect("ts");
        let monday = DateTime::parse_from_rfc3339("2024-06-03T12:00:00+00:00").expect("ts");
        let matcher = store.matcher();
        assert_eq!(matcher.due(&ClockSnapshot::at(&saturday)).len(), 1);
        assert!(matcher.due(&ClockSnapshot::at(&monday)).is_empty());
    }
}
