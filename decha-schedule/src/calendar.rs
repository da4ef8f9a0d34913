use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use decha_core::kv::CALENDAR_KEY;
use decha_core::serde_utils::to_pretty_json;
use decha_core::KeyValueStore;
use decha_time::DechaHourMinute;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::loader::parse_records;
use crate::persist::Slot;

/// DECHA minutes in one day (10 hours of 100 minutes).
pub const DECHA_MINUTES_PER_DAY: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    #[default]
    Work,
    Personal,
    Health,
    Other,
}

impl EventCategory {
    /// Accent colour shown next to events of this category.
    pub fn color(&self) -> &'static str {
        match self {
            EventCategory::Work => "#3b82f6",
            EventCategory::Personal => "#10b981",
            EventCategory::Health => "#ec4899",
            EventCategory::Other => "#8b5cf6",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Work => "work",
            EventCategory::Personal => "personal",
            EventCategory::Health => "health",
            EventCategory::Other => "other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(EventCategory::Work),
            "personal" => Ok(EventCategory::Personal),
            "health" => Ok(EventCategory::Health),
            "other" => Ok(EventCategory::Other),
            _ => Err(ScheduleError::InvalidEvent(format!("unknown category `{value}`"))),
        }
    }
}

/// Recurrence label. Events are listed on their own `date` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRepeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for EventRepeat {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(EventRepeat::None),
            "daily" => Ok(EventRepeat::Daily),
            "weekly" => Ok(EventRepeat::Weekly),
            "monthly" => Ok(EventRepeat::Monthly),
            _ => Err(ScheduleError::InvalidEvent(format!("unknown repeat `{value}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub decha_start: DechaHourMinute,
    /// Length in DECHA minutes.
    pub duration: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub repeat: EventRepeat,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// DECHA time the event ends, wrapping past midnight.
    pub fn end(&self) -> DechaHourMinute {
        DechaHourMinute::from_flat((self.decha_start.flat() + self.duration) % DECHA_MINUTES_PER_DAY)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.title.trim().is_empty() {
            return Err(ScheduleError::InvalidEvent(format!("{}: title is empty", self.id)));
        }
        DechaHourMinute::new(self.decha_start.hours, self.decha_start.minutes)?;
        if self.duration == 0 || self.duration > DECHA_MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidEvent(format!(
                "{}: duration {} is outside 1..={DECHA_MINUTES_PER_DAY} DECHA minutes",
                self.id, self.duration
            )));
        }
        Ok(())
    }
}

/// Form input for a new event. The colour follows the category.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub decha_start: DechaHourMinute,
    pub duration: u32,
    pub date: NaiveDate,
    pub category: EventCategory,
    pub repeat: EventRepeat,
}

impl EventDraft {
    pub fn new(
        title: impl Into<String>,
        date: NaiveDate,
        decha_start: DechaHourMinute,
        duration: u32,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            decha_start,
            duration,
            date,
            category: EventCategory::Work,
            repeat: EventRepeat::None,
        }
    }

    pub fn category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub decha_start: Option<DechaHourMinute>,
    pub duration: Option<u32>,
    pub date: Option<NaiveDate>,
    pub category: Option<EventCategory>,
    pub repeat: Option<EventRepeat>,
}

/// Calendar events with write-through persistence under `decha-calendar`.
#[derive(Debug, Clone)]
pub struct CalendarStore {
    inner: Arc<RwLock<Vec<CalendarEvent>>>,
    slot: Slot,
}

impl Default for CalendarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
            slot: Slot::detached(CALENDAR_KEY),
        }
    }

    pub fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self, ScheduleError> {
        let slot = Slot::attached(kv, CALENDAR_KEY);
        let events: Vec<CalendarEvent> = slot.load()?.unwrap_or_default();
        Ok(Self {
            inner: Arc::new(RwLock::new(events)),
            slot,
        })
    }

    pub fn list(&self) -> Vec<CalendarEvent> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<CalendarEvent> {
        self.inner.read().iter().find(|event| event.id == id).cloned()
    }

    pub fn add(&self, draft: EventDraft, now: DateTime<Utc>) -> Result<CalendarEvent, ScheduleError> {
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            decha_start: draft.decha_start,
            duration: draft.duration,
            date: draft.date,
            color: draft.category.color().to_string(),
            category: draft.category,
            repeat: draft.repeat,
            completed: false,
            created_at: now,
        };
        event.validate()?;
        self.mutate(|events| {
            events.push(event.clone());
            Ok(event)
        })
    }

    pub fn update(&self, id: &str, update: EventUpdate) -> Result<CalendarEvent, ScheduleError> {
        self.mutate(|events| {
            let event = find_mut(events, id)?;
            let mut next = event.clone();
            if let Some(title) = update.title {
                next.title = title;
            }
            if let Some(description) = update.description {
                next.description = description;
            }
            if let Some(start) = update.decha_start {
                next.decha_start = start;
            }
            if let Some(duration) = update.duration {
                next.duration = duration;
            }
            if let Some(date) = update.date {
                next.date = date;
            }
            if let Some(category) = update.category {
                next.category = category;
                next.color = category.color().to_string();
            }
            if let Some(repeat) = update.repeat {
                next.repeat = repeat;
            }
            next.validate()?;
            *event = next.clone();
            Ok(next)
        })
    }

    pub fn delete(&self, id: &str) -> Result<CalendarEvent, ScheduleError> {
        self.mutate(|events| {
            let index = events
                .iter()
                .position(|event| event.id == id)
                .ok_or_else(|| ScheduleError::EventNotFound(id.to_string()))?;
            Ok(events.remove(index))
        })
    }

    pub fn toggle_complete(&self, id: &str) -> Result<CalendarEvent, ScheduleError> {
        self.mutate(|events| {
            let event = find_mut(events, id)?;
            event.completed = !event.completed;
            Ok(event.clone())
        })
    }

    /// Events on `date`, earliest start first.
    pub fn events_for_date(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        let mut events: Vec<_> = self
            .inner
            .read()
            .iter()
            .filter(|event| event.date == date)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.decha_start);
        events
    }

    /// Events on the seven days starting at `start`, day by day.
    pub fn events_for_week(&self, start: NaiveDate) -> Vec<CalendarEvent> {
        (0..7)
            .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
            .flat_map(|date| self.events_for_date(date))
            .collect()
    }

    pub fn clear(&self) -> Result<(), ScheduleError> {
        self.mutate(|events| {
            events.clear();
            Ok(())
        })
    }

    pub fn export_json(&self) -> Result<String, ScheduleError> {
        Ok(to_pretty_json(&*self.inner.read())?)
    }

    /// Replaces every event with the imported list.
    pub fn import_json(&self, raw: &str) -> Result<usize, ScheduleError> {
        let imported: Vec<CalendarEvent> = parse_records(raw, "calendar import", "events")?;
        self.replace_all(imported)
    }

    /// Replaces every event once all of `imported` validates.
    pub fn replace_all(&self, imported: Vec<CalendarEvent>) -> Result<usize, ScheduleError> {
        for event in &imported {
            event.validate()?;
        }
        let count = imported.len();
        self.mutate(move |events| {
            *events = imported;
            Ok(())
        })?;
        info!(count, "imported calendar events");
        Ok(count)
    }

    fn mutate<T, F>(&self, edit: F) -> Result<T, ScheduleError>
    where
        F: FnOnce(&mut Vec<CalendarEvent>) -> Result<T, ScheduleError>,
    {
        let mut inner = self.inner.write();
        let mut next = inner.clone();
        let result = edit(&mut next)?;
        self.slot.save(&next)?;
        *inner = next;
        Ok(result)
    }
}

fn find_mut<'a>(
    events: &'a mut [CalendarEvent],
    id: &str,
) -> Result<&'a mut CalendarEvent, ScheduleError> {
    events
        .iter_mut()
        .find(|event| event.id == id)
        .ok_or_else(|| ScheduleError::EventNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::FlakyStore;
    use chrono::TimeZone;
    use decha_core::MemoryStore;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("date")
    }

    fn hm(hours: u8, minutes: u8) -> DechaHourMinute {
        DechaHourMinute { hours, minutes }
    }

    #[test]
    fn add_assigns_identity_and_color() {
        let store = CalendarStore::new();
        let event = store
            .add(
                EventDraft::new("Standup", date(3), hm(3, 20), 15).category(EventCategory::Health),
                Utc::now(),
            )
            .expect("add");
        assert!(!event.id.is_empty());
        assert_eq!(event.color, "#ec4899");
        assert!(!event.completed);
        assert_eq!(event.end(), hm(3, 35));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn end_wraps_past_midnight() {
        let store = CalendarStore::new();
        let event = store
            .add(EventDraft::new("Late", date(3), hm(9, 80), 50), Utc::now())
            .expect("add");
        assert_eq!(event.end(), hm(0, 30));
    }

    #[test]
    fn rejects_invalid_events() {
        let store = CalendarStore::new();
        assert!(store.add(EventDraft::new("  ", date(3), hm(1, 0), 10), Utc::now()).is_err());
        assert!(store.add(EventDraft::new("x", date(3), hm(1, 0), 0), Utc::now()).is_err());
        assert!(store.add(EventDraft::new("x", date(3), hm(1, 100), 10), Utc::now()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn queries_by_date_and_week() {
        let store = CalendarStore::new();
        let now = Utc::now();
        store.add(EventDraft::new("b", date(3), hm(5, 0), 10), now).expect("add");
        store.add(EventDraft::new("a", date(3), hm(1, 0), 10), now).expect("add");
        store.add(EventDraft::new("c", date(9), hm(1, 0), 10), now).expect("add");
        store.add(EventDraft::new("d", date(10), hm(1, 0), 10), now).expect("add");

        let titles = |events: Vec<CalendarEvent>| -> Vec<String> {
            events.into_iter().map(|event| event.title).collect()
        };
        assert_eq!(titles(store.events_for_date(date(3))), ["a", "b"]);
        assert_eq!(titles(store.events_for_week(date(3))), ["a", "b", "c"]);
    }

    #[test]
    fn update_toggle_and_delete() {
        let store = CalendarStore::new();
        let event = store
            .add(EventDraft::new("Run", date(4), hm(2, 0), 30), Utc::now())
            .expect("add");

        let updated = store
            .update(
                &event.id,
                EventUpdate {
                    category: Some(EventCategory::Personal),
                    duration: Some(45),
                    ..EventUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.color, EventCategory::Personal.color());
        assert_eq!(updated.duration, 45);

        assert!(store.toggle_complete(&event.id).expect("toggle").completed);
        assert!(!store.toggle_complete(&event.id).expect("toggle").completed);

        store.delete(&event.id).expect("delete");
        assert!(matches!(store.delete(&event.id), Err(ScheduleError::EventNotFound(_))));
    }

    #[test]
    fn replace_all_validates_every_event() {
        let store = CalendarStore::new();
        let kept = store
            .add(EventDraft::new("Kept", date(3), hm(1, 0), 10), Utc::now())
            .expect("add");
        let broken = CalendarEvent {
            id: "broken".to_string(),
            title: String::new(),
            description: None,
            decha_start: hm(42, 250),
            duration: 0,
            date: date(3),
            category: EventCategory::Other,
            color: String::new(),
            repeat: EventRepeat::None,
            completed: false,
            created_at: Utc::now(),
        };
        assert!(store.replace_all(vec![kept.clone(), broken.clone()]).is_err());

        let out_of_range = CalendarEvent {
            title: "Late".to_string(),
            duration: 10,
            ..broken
        };
        assert!(store.replace_all(vec![out_of_range]).is_err());
        assert_eq!(store.list(), [kept]);
    }

    #[test]
    fn failed_save_keeps_previous_events() {
        let kv = Arc::new(FlakyStore::default());
        let store = CalendarStore::load(kv.clone()).expect("load");
        let draft = || EventDraft::new("Run", date(4), hm(2, 0), 30);
        let event = store.add(draft(), Utc::now()).expect("add");

        kv.fail_writes(true);
        assert!(matches!(store.add(draft(), Utc::now()), Err(ScheduleError::Storage(_))));
        assert!(store.toggle_complete(&event.id).is_err());
        assert_eq!(store.list(), [event]);

        kv.fail_writes(false);
        store.add(draft(), Utc::now()).expect("retry");
        assert_eq!(CalendarStore::load(kv).expect("reload").len(), 2);
    }

    #[test]
    fn persists_and_round_trips_exports() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = CalendarStore::load(Arc::clone(&kv)).expect("load");
        let created = Utc.timestamp_millis_opt(1_717_200_000_000).single().expect("timestamp");
        store
            .add(EventDraft::new("Review", date(5), hm(6, 40), 20).description("weekly"), created)
            .expect("add");

        let exported = store.export_json().expect("export");
        assert!(exported.contains("\"dechaStart\""));
        assert!(exported.contains("\"2024-06-05\""));

        let reloaded = CalendarStore::load(Arc::clone(&kv)).expect("reload");
        assert_eq!(reloaded.list(), store.list());

        let other = CalendarStore::new();
        assert_eq!(other.import_json(&exported).expect("import"), 1);
        assert_eq!(other.list(), store.list());
        store.clear().expect("clear");
        assert!(CalendarStore::load(kv).expect("reload").is_empty());
    }
}
