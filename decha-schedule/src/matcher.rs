use chrono::{DateTime, TimeZone};
use decha_time::{ClockSnapshot, DechaFields};
use tracing::debug;

use crate::alarm::{Alarm, AlarmRepeat};
use crate::outcome::TriggerDecision;

/// Decides whether `alarm` fires at `current`.
///
/// `today` is the weekday index of `now` (Sunday = 0). The trigger time must
/// match to the DECHA second, so callers have to observe every second. An
/// alarm that already fired on `now`'s calendar date is held back unless it
/// repeats daily.
pub fn evaluate_alarm<Tz: TimeZone>(
    alarm: &Alarm,
    current: &impl DechaFields,
    today: u8,
    now: &DateTime<Tz>,
) -> TriggerDecision {
    if !alarm.enabled {
        return TriggerDecision::Disabled;
    }

    let target = &alarm.decha_time;
    if target.hours() != current.hours()
        || target.minutes() != current.minutes()
        || target.seconds() != current.seconds()
    {
        return TriggerDecision::TimeMismatch;
    }

    if alarm.repeat != AlarmRepeat::Daily && triggered_on_same_day(alarm, now) {
        return TriggerDecision::AlreadyTriggeredToday;
    }

    match alarm.repeat {
        AlarmRepeat::Once if alarm.last_triggered.is_some() => TriggerDecision::Exhausted,
        AlarmRepeat::Once | AlarmRepeat::Daily => TriggerDecision::Fire,
        AlarmRepeat::Weekdays if (1..=5).contains(&today) => TriggerDecision::Fire,
        AlarmRepeat::Weekends if today == 0 || today == 6 => TriggerDecision::Fire,
        AlarmRepeat::Custom if alarm.runs_on(today) => TriggerDecision::Fire,
        _ => TriggerDecision::NotScheduledToday,
    }
}

pub fn should_trigger<Tz: TimeZone>(
    alarm: &Alarm,
    current: &impl DechaFields,
    today: u8,
    now: &DateTime<Tz>,
) -> bool {
    evaluate_alarm(alarm, current, today, now).should_fire()
}

fn triggered_on_same_day<Tz: TimeZone>(alarm: &Alarm, now: &DateTime<Tz>) -> bool {
    alarm
        .last_triggered
        .map(|last| last.with_timezone(&now.timezone()).date_naive() == now.date_naive())
        .unwrap_or(false)
}

/// Evaluates a set of alarms against clock snapshots.
#[derive(Debug, Default, Clone)]
pub struct AlarmMatcher {
    alarms: Vec<Alarm>,
}

impl AlarmMatcher {
    /// Orders alarms by trigger time, then id.
    pub fn new(mut alarms: Vec<Alarm>) -> Self {
        alarms.sort_by(|a, b| {
            a.trigger_seconds()
                .cmp(&b.trigger_seconds())
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { alarms }
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Alarms that fire at the snapshot. Each alarm is judged on its own.
    pub fn due(&self, snapshot: &ClockSnapshot) -> Vec<&Alarm> {
        let today = snapshot.weekday_index();
        self.alarms
            .iter()
            .filter(|alarm| {
                let decision = evaluate_alarm(alarm, &snapshot.decha, today, &snapshot.instant);
                if decision == TriggerDecision::Fire {
                    debug!(alarm_id = %alarm.id, time = %alarm.decha_time, "alarm matched");
                } else if decision != TriggerDecision::TimeMismatch {
                    debug!(alarm_id = %alarm.id, reason = decision.as_str(), "alarm held back");
                }
                decision.should_fire()
            })
            .collect()
    }
}
