use std::sync::Arc;

use chrono::{DateTime, Utc};
use decha_core::kv::ALARMS_KEY;
use decha_core::serde_utils::to_pretty_json;
use decha_core::KeyValueStore;
use decha_time::{DechaClock, DechaFields};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::alarm::{Alarm, AlarmDraft, AlarmId, AlarmUpdate};
use crate::error::ScheduleError;
use crate::loader::parse_records;
use crate::matcher::AlarmMatcher;
use crate::persist::Slot;

/// Alarm list kept sorted by trigger time, with write-through persistence
/// under `decha-alarms` and change notifications.
#[derive(Debug, Clone)]
pub struct AlarmStore {
    inner: Arc<RwLock<Vec<Alarm>>>,
    slot: Slot,
    changes: Arc<watch::Sender<Vec<Alarm>>>,
}

impl Default for AlarmStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::with_alarms(Vec::new(), Slot::detached(ALARMS_KEY))
    }

    /// Loads the persisted alarm list.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self, ScheduleError> {
        let slot = Slot::attached(kv, ALARMS_KEY);
        let alarms: Vec<Alarm> = slot.load()?.unwrap_or_default();
        debug!(count = alarms.len(), "loaded alarms");
        Ok(Self::with_alarms(alarms, slot))
    }

    fn with_alarms(mut alarms: Vec<Alarm>, slot: Slot) -> Self {
        sort(&mut alarms);
        let (changes, _) = watch::channel(alarms.clone());
        Self {
            inner: Arc::new(RwLock::new(alarms)),
            slot,
            changes: Arc::new(changes),
        }
    }

    pub fn list(&self) -> Vec<Alarm> {
        self.inner.read().clone()
    }

    pub fn enabled(&self) -> Vec<Alarm> {
        self.inner
            .read()
            .iter()
            .filter(|alarm| alarm.enabled)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn get(&self, id: &AlarmId) -> Option<Alarm> {
        self.inner.read().iter().find(|alarm| &alarm.id == id).cloned()
    }

    /// Receives the full alarm list after every change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Alarm>> {
        self.changes.subscribe()
    }

    /// Matcher over the enabled alarms.
    pub fn matcher(&self) -> AlarmMatcher {
        AlarmMatcher::new(self.enabled())
    }

    pub fn add(&self, draft: AlarmDraft, now: DateTime<Utc>) -> Result<Alarm, ScheduleError> {
        let alarm = Alarm::new(draft, now)?;
        let added = self.mutate(|alarms| {
            alarms.push(alarm.clone());
            Ok(alarm)
        })?;
        info!(alarm_id = %added.id, time = %added.decha_time, repeat = %added.repeat, "alarm added");
        Ok(added)
    }

    pub fn update(&self, id: &AlarmId, update: AlarmUpdate) -> Result<Alarm, ScheduleError> {
        self.mutate(|alarms| {
            let alarm = find_mut(alarms, id)?;
            alarm.apply(update)?;
            Ok(alarm.clone())
        })
    }

    pub fn delete(&self, id: &AlarmId) -> Result<Alarm, ScheduleError> {
        self.mutate(|alarms| {
            let index = alarms
                .iter()
                .position(|alarm| &alarm.id == id)
                .ok_or_else(|| ScheduleError::AlarmNotFound(id.to_string()))?;
            Ok(alarms.remove(index))
        })
    }

    pub fn toggle(&self, id: &AlarmId) -> Result<Alarm, ScheduleError> {
        self.mutate(|alarms| {
            let alarm = find_mut(alarms, id)?;
            alarm.enabled = !alarm.enabled;
            Ok(alarm.clone())
        })
    }

    /// Moves the trigger time `minutes` DECHA minutes later and re-arms the
    /// alarm so it can fire again today.
    pub fn snooze(&self, id: &AlarmId, minutes: u32) -> Result<Alarm, ScheduleError> {
        self.mutate(|alarms| {
            let alarm = find_mut(alarms, id)?;
            let shifted = alarm.decha_time.total_seconds() + (minutes % 1_000) * 100;
            alarm.decha_time = DechaClock::from_total_seconds(shifted);
            alarm.snooze_count += 1;
            alarm.last_triggered = None;
            alarm.enabled = true;
            Ok(alarm.clone())
        })
    }

    /// Records a trigger and resets the snooze counter.
    ///
    /// Unlike the other edits the mark is committed in memory and broadcast
    /// before it is persisted, and it stays even when the save fails. The
    /// save error is still returned.
    pub fn mark_triggered(&self, id: &AlarmId, at: DateTime<Utc>) -> Result<Alarm, ScheduleError> {
        let mut alarms = self.inner.write();
        let alarm = find_mut(&mut alarms, id)?;
        alarm.last_triggered = Some(at);
        alarm.snooze_count = 0;
        let marked = alarm.clone();
        self.changes.send_replace(alarms.clone());
        self.slot.save(&*alarms)?;
        Ok(marked)
    }

    pub fn clear(&self) -> Result<(), ScheduleError> {
        self.mutate(|alarms| {
            alarms.clear();
            Ok(())
        })
    }

    pub fn export_json(&self) -> Result<String, ScheduleError> {
        Ok(to_pretty_json(&*self.inner.read())?)
    }

    /// Replaces every alarm with the imported list.
    pub fn import_json(&self, raw: &str) -> Result<usize, ScheduleError> {
        let imported: Vec<Alarm> = parse_records(raw, "alarm import", "alarms")?;
        self.replace_all(imported)
    }

    pub fn replace_all(&self, imported: Vec<Alarm>) -> Result<usize, ScheduleError> {
        for alarm in &imported {
            alarm.validate()?;
        }
        let count = imported.len();
        self.mutate(move |alarms| {
            *alarms = imported;
            Ok(())
        })?;
        info!(count, "imported alarms");
        Ok(count)
    }

    /// Applies `edit` to a copy of the list. The copy replaces the live list
    /// and reaches subscribers only once it has been saved.
    fn mutate<T, F>(&self, edit: F) -> Result<T, ScheduleError>
    where
        F: FnOnce(&mut Vec<Alarm>) -> Result<T, ScheduleError>,
    {
        let mut inner = self.inner.write();
        let mut next = inner.clone();
        let result = edit(&mut next)?;
        sort(&mut next);
        self.slot.save(&next)?;
        *inner = next;
        self.changes.send_replace(inner.clone());
        Ok(result)
    }
}

fn sort(alarms: &mut [Alarm]) {
    alarms.sort_by_key(Alarm::trigger_seconds);
}

fn find_mut<'a>(alarms: &'a mut [Alarm], id: &AlarmId) -> Result<&'a mut Alarm, ScheduleError> {
    alarms
        .iter_mut()
        .find(|alarm| &alarm.id == id)
        .ok_or_else(|| ScheduleError::AlarmNotFound(id.to_string()))
}
