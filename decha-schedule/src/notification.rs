use async_trait::async_trait;
use decha_time::{decha_to_earth_seconds, DayPeriod, DechaFields, EarthTime};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::alarm::Alarm;
use crate::error::ScheduleError;

pub const HOURLY_TAG: &str = "hourly-notification";

/// Platform-neutral notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other.
    pub tag: String,
    pub require_interaction: bool,
    /// Play an audible cue alongside the notification.
    pub sound: bool,
}

impl Notification {
    /// `⏰ {label}` with the trigger time on both clocks.
    pub fn for_alarm(alarm: &Alarm, sound_enabled: bool) -> Self {
        let time = &alarm.decha_time;
        let earth = EarthTime::from_seconds(decha_to_earth_seconds(time));
        Self {
            title: format!("⏰ {}", alarm.label),
            body: format!(
                "DECHA: {}:{:02}:{:02}\nEarth: {:02}:{:02}",
                time.hours(),
                time.minutes(),
                time.seconds(),
                earth.hours,
                earth.minutes
            ),
            tag: format!("alarm-{}", alarm.id),
            require_interaction: true,
            sound: alarm.sound && sound_enabled,
        }
    }

    /// Top-of-hour chime, e.g. `4:00:00 DECHA`.
    pub fn hourly(hour: u8, period: DayPeriod, sound_enabled: bool) -> Self {
        Self {
            title: format!("{hour}:00:00 DECHA"),
            body: period.description().to_string(),
            tag: HOURLY_TAG.to_string(),
            require_interaction: false,
            sound: sound_enabled,
        }
    }
}

/// Delivery collaborator. Failures are reported back but never retried.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn deliver(&self, notification: &Notification) -> Result<(), ScheduleError>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), ScheduleError> {
        info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            sound = notification.sound,
            "notification"
        );
        Ok(())
    }
}

/// Forwards notifications to an async consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), ScheduleError> {
        self.tx
            .send(notification.clone())
            .map_err(|_| ScheduleError::Delivery("notification receiver dropped".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmDraft, AlarmId};
    use chrono::Utc;
    use decha_time::DechaClock;

    fn wake_alarm() -> Alarm {
        let draft = AlarmDraft::new(DechaClock { hours: 2, minutes: 50, seconds: 0 }, "Wake up");
        let mut alarm = Alarm::new(draft, Utc::now()).expect("alarm");
        alarm.id = AlarmId::new("abc");
        alarm
    }

    #[test]
    fn alarm_payload_shows_both_clocks() {
        let notification = Notification::for_alarm(&wake_alarm(), true);
        assert_eq!(notification.title, "⏰ Wake up");
        assert_eq!(notification.body, "DECHA: 2:50:00\nEarth: 06:00");
        assert_eq!(notification.tag, "alarm-abc");
        assert!(notification.require_interaction);
        assert!(notification.sound);
    }

    #[test]
    fn sound_needs_both_switches() {
        let mut alarm = wake_alarm();
        assert!(!Notification::for_alarm(&alarm, false).sound);
        alarm.sound = false;
        assert!(!Notification::for_alarm(&alarm, true).sound);
    }

    #[test]
    fn hourly_payload() {
        let notification = Notification::hourly(4, DayPeriod::Midday, false);
        assert_eq!(notification.title, "4:00:00 DECHA");
        assert_eq!(notification.body, DayPeriod::Midday.description());
        assert_eq!(notification.tag, HOURLY_TAG);
        assert!(!notification.require_interaction);
    }

    #[tokio::test]
    async fn channel_sink_forwards_and_reports_closed_receiver() {
        let (sink, mut rx) = ChannelSink::new();
        let notification = Notification::hourly(1, DayPeriod::Dawn, true);
        sink.deliver(&notification).await.expect("deliver");
        assert_eq!(rx.recv().await, Some(notification.clone()));

        drop(rx);
        assert!(matches!(
            sink.deliver(&notification).await,
            Err(ScheduleError::Delivery(_))
        ));
    }
}
