// Alarm evaluation end to end: stores on disk, quiet hours and the poller.
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use decha::core::{JsonFileStore, KeyValueStore};
use decha::schedule::{should_trigger, AlarmDraft, ChannelSink, Notification, ScheduleError};
use decha::time::{Clock, DechaHourMinute, FixedClock};
use decha::{Alarm, AlarmPoller, AlarmRepeat, AlarmStore, DechaClock, SettingsStore};
use tokio::sync::mpsc;

// 2024-06-03 is a Monday; 06:00 Earth reads 2:50:00 DECHA.
const MONDAY_SIX: &str = "2024-06-03T06:00:00+00:00";

fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).expect("timestamp")
}

fn wake() -> DechaClock {
    DechaClock { hours: 2, minutes: 50, seconds: 0 }
}

fn alarm(repeat: AlarmRepeat) -> Alarm {
    let mut draft = AlarmDraft::new(wake(), "Wake").repeat(repeat);
    if repeat == AlarmRepeat::Custom {
        draft = draft.custom_days([1, 3]);
    }
    Alarm::new(draft, Utc::now()).expect("alarm")
}

#[test]
fn daily_alarm_needs_the_exact_second() {
    let alarm = alarm(AlarmRepeat::Daily);
    let now = at(MONDAY_SIX);
    assert!(should_trigger(&alarm, &wake(), 1, &now));
    assert!(!should_trigger(&alarm, &DechaClock { hours: 2, minutes: 50, seconds: 1 }, 1, &now));
    assert!(!should_trigger(&alarm, &DechaClock { hours: 2, minutes: 49, seconds: 0 }, 1, &now));
}

#[test]
fn once_alarm_is_spent_after_firing() {
    let mut alarm = alarm(AlarmRepeat::Once);
    alarm.last_triggered = Some(Utc::now() - Duration::days(30));
    for day in 0..7 {
        assert!(!should_trigger(&alarm, &wake(), day, &at(MONDAY_SIX)));
    }
}

#[test]
fn custom_alarm_fires_on_listed_days_only() {
    let alarm = alarm(AlarmRepeat::Custom);
    let fired: Vec<u8> = (0..7)
        .filter(|day| should_trigger(&alarm, &wake(), *day, &at(MONDAY_SIX)))
        .collect();
    assert_eq!(fired, [1, 3]);
}

struct Setup {
    _dir: tempfile::TempDir,
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<FixedClock>,
}

impl Setup {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(dir.path()).expect("open"));
        Self {
            _dir: dir,
            kv,
            clock: Arc::new(FixedClock::new(at(MONDAY_SIX))),
        }
    }

    fn poller(&self) -> (AlarmPoller, mpsc::UnboundedReceiver<Notification>) {
        let (sink, rx) = ChannelSink::new();
        let poller = AlarmPoller::new(
            AlarmStore::load(Arc::clone(&self.kv)).expect("alarms"),
            SettingsStore::load(Arc::clone(&self.kv)).expect("settings"),
            Arc::clone(&self.clock) as Arc<dyn Clock>,
            Arc::new(sink),
        );
        (poller, rx)
    }
}

#[tokio::test]
async fn trigger_survives_a_restart() {
    let setup = Setup::new();
    let store = AlarmStore::load(Arc::clone(&setup.kv)).expect("alarms");
    store
        .add(AlarmDraft::new(wake(), "Wake").repeat(AlarmRepeat::Weekdays), Utc::now())
        .expect("add");

    let (mut poller, mut rx) = setup.poller();
    assert_eq!(poller.tick().await.fired.len(), 1);
    let notification = rx.recv().await.expect("notification");
    assert!(notification.require_interaction);
    drop(poller);

    // A fresh process in the same second reads the persisted trigger.
    let (mut restarted, mut rx) = setup.poller();
    assert!(restarted.tick().await.fired.is_empty());
    assert!(rx.try_recv().is_err());

    setup.clock.advance(Duration::days(1));
    assert_eq!(restarted.tick().await.fired.len(), 1);
}

#[tokio::test]
async fn quiet_hours_from_saved_settings() {
    let setup = Setup::new();
    AlarmStore::load(Arc::clone(&setup.kv))
        .expect("alarms")
        .add(AlarmDraft::new(wake(), "Wake").repeat(AlarmRepeat::Daily), Utc::now())
        .expect("add");
    let settings = SettingsStore::load(Arc::clone(&setup.kv)).expect("settings");
    settings
        .set_quiet_hours(DechaHourMinute { hours: 9, minutes: 0 }, DechaHourMinute { hours: 3, minutes: 0 })
        .expect("window");
    settings.set_quiet_hours_enabled(true).expect("enable");

    let (mut poller, mut rx) = setup.poller();
    let outcome = poller.tick().await;
    assert!(outcome.quiet_hours);
    assert_eq!(outcome.suppressed.len(), 1);
    assert!(rx.try_recv().is_err());

    settings.set_quiet_hours_enabled(false).expect("disable");
    let (mut poller, mut rx) = setup.poller();
    assert_eq!(poller.tick().await.fired.len(), 1);
    assert!(rx.recv().await.is_some());
}

#[test]
fn import_file_replaces_alarms() {
    let setup = Setup::new();
    let store = AlarmStore::load(Arc::clone(&setup.kv)).expect("alarms");
    store.add(AlarmDraft::new(wake(), "Old"), Utc::now()).expect("add");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("alarms.yaml");
    std::fs::write(
        &path,
        "alarms:\n  - id: gym\n    dechaTime: { hours: 7, minutes: 50, seconds: 0 }\n    label: Gym\n    repeat: custom\n    customDays: [2, 4]\n    createdAt: 1717200000000\n",
    )
    .expect("write");

    let imported = decha::schedule::load_alarms(&path).expect("load");
    assert_eq!(store.replace_all(imported).expect("replace"), 1);
    let reloaded = AlarmStore::load(Arc::clone(&setup.kv)).expect("reload");
    let alarms = reloaded.list();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].label, "Gym");
    assert_eq!(alarms[0].custom_days, [2, 4]);

    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "- id: x\n  dechaTime: { hours: 12, minutes: 0, seconds: 0 }\n  createdAt: 0\n")
        .expect("write");
    let parsed = decha::schedule::load_alarms(&bad).expect("parses");
    assert!(matches!(
        reloaded.replace_all(parsed),
        Err(ScheduleError::InvalidAlarm(_))
    ));
    assert_eq!(reloaded.list()[0].label, "Gym");
}
