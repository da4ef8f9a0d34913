use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use decha_core::config::may_skip_seconds;
use decha_time::{Clock, ClockSnapshot};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::chime::HourlyChime;
use crate::notification::{Notification, NotificationSink};
use crate::outcome::TickOutcome;
use crate::settings::SettingsStore;
use crate::store::AlarmStore;

/// Drives alarm evaluation from wall-clock reads.
///
/// Each DECHA second is evaluated once. During quiet hours matched alarms
/// are neither delivered nor marked as triggered. Outside quiet hours a
/// fired alarm is marked before delivery, so a failed delivery still counts
/// as fired.
pub struct AlarmPoller {
    alarms: AlarmStore,
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    chime: HourlyChime,
    last_checked: Option<(NaiveDate, u32)>,
}

impl AlarmPoller {
    pub fn new(
        alarms: AlarmStore,
        settings: SettingsStore,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            alarms,
            settings,
            clock,
            sink,
            chime: HourlyChime::new(),
            last_checked: None,
        }
    }

    pub fn alarms(&self) -> &AlarmStore {
        &self.alarms
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Reads the clock and evaluates the current DECHA second.
    pub async fn tick(&mut self) -> TickOutcome {
        let snapshot = self.clock.snapshot();
        self.evaluate(&snapshot).await
    }

    pub async fn evaluate(&mut self, snapshot: &ClockSnapshot) -> TickOutcome {
        let key = (snapshot.date, snapshot.decha.total_seconds);
        if self.last_checked == Some(key) {
            return TickOutcome::skipped();
        }
        self.last_checked = Some(key);

        let settings = self.settings.get();
        let mut outcome = TickOutcome::at(snapshot.decha.clock());
        let matcher = self.alarms.matcher();
        let due = matcher.due(snapshot);

        if settings.quiet_hours().is_active(&snapshot.decha) {
            outcome.quiet_hours = true;
            for alarm in due {
                debug!(alarm_id = %alarm.id, "alarm held back by quiet hours");
                outcome.record_suppressed(alarm.id.clone());
            }
            return outcome;
        }

        let fired_at = snapshot.instant.with_timezone(&Utc);
        for alarm in due {
            if let Err(err) = self.alarms.mark_triggered(&alarm.id, fired_at) {
                warn!(alarm_id = %alarm.id, %err, "failed to record alarm trigger");
                outcome.push_note(format!("{}: {err}", alarm.id));
            }

            let notification = Notification::for_alarm(alarm, settings.notification_sound);
            info!(alarm_id = %alarm.id, label = %alarm.label, time = %alarm.decha_time, "alarm fired");
            self.dispatch(&notification, &mut outcome).await;
            outcome.record_fire(alarm.id.clone());
        }

        if settings.enable_hourly_notifications {
            if let Some(notification) = self.chime.poll(
                settings.notification_frequency,
                settings.notification_sound,
                snapshot,
            ) {
                info!(title = %notification.title, "hourly chime");
                self.dispatch(&notification, &mut outcome).await;
                outcome.chimed = true;
            }
        }

        outcome
    }

    async fn dispatch(&self, notification: &Notification, outcome: &mut TickOutcome) {
        if let Err(err) = self.sink.deliver(notification).await {
            warn!(tag = %notification.tag, %err, "notification delivery failed");
            outcome.push_note(format!("{}: {err}", notification.tag));
        }
    }

    /// Ticks every `period` until `shutdown` resolves or its sender is dropped.
    pub async fn run(&mut self, period: Duration, shutdown: oneshot::Receiver<()>) {
        let stopped = async {
            let _ = shutdown.await;
            Ok::<(), Infallible>(())
        };
        self.run_until(period, stopped, |_, _| Ok(()))
            .await
            .unwrap_or_else(|never| match never {});
    }

    /// Ticks every `period` until `shutdown` completes, handing every
    /// evaluated DECHA second to `on_tick`. An error from `shutdown` or
    /// `on_tick` ends the loop and is returned.
    pub async fn run_until<S, F, E>(
        &mut self,
        period: Duration,
        shutdown: S,
        mut on_tick: F,
    ) -> Result<(), E>
    where
        S: Future<Output = Result<(), E>>,
        F: FnMut(&ClockSnapshot, &TickOutcome) -> Result<(), E>,
    {
        if may_skip_seconds(period) {
            warn!(
                period_ms = period.as_millis() as u64,
                "poll period is longer than one DECHA second, alarms may be missed"
            );
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        info!(period_ms = period.as_millis() as u64, "alarm poller started");

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    info!("alarm poller stopped");
                    return result;
                }
                _ = ticker.tick() => {
                    let snapshot = self.clock.snapshot();
                    let outcome = self.evaluate(&snapshot).await;
                    if !outcome.was_evaluated() {
                        continue;
                    }
                    if !outcome.is_silent() {
                        debug!(fired = outcome.fired.len(), chimed = outcome.chimed, "tick");
                    }
                    on_tick(&snapshot, &outcome)?;
                }
            }
        }
    }

    /// Runs the poller on the current runtime. Send on (or drop) the returned
    /// sender to stop it.
    pub fn spawn(mut self, period: Duration) -> (oneshot::Sender<()>, JoinHandle<Self>) {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            self.run(period, rx).await;
            self
        });
        (tx, handle)
    }
}
