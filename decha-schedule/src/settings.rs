use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use decha_core::kv::SETTINGS_KEY;
use decha_core::KeyValueStore;
use decha_time::{DechaHourMinute, QuietHoursConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::chime::ChimeFrequency;
use crate::error::ScheduleError;
use crate::persist::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Navy,
    Sunset,
    Matrix,
    Cosmic,
    Minimal,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Navy,
        Theme::Sunset,
        Theme::Matrix,
        Theme::Cosmic,
        Theme::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Navy => "navy",
            Theme::Sunset => "sunset",
            Theme::Matrix => "matrix",
            Theme::Cosmic => "cosmic",
            Theme::Minimal => "minimal",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ScheduleError::InvalidSetting(format!("unknown theme `{value}`")))
    }
}

/// Which readings the main display shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    #[default]
    Standard,
    Percentage,
    Both,
}

impl DisplayFormat {
    pub fn shows_clock(&self) -> bool {
        matches!(self, DisplayFormat::Standard | DisplayFormat::Both)
    }

    pub fn shows_percentage(&self) -> bool {
        matches!(self, DisplayFormat::Percentage | DisplayFormat::Both)
    }
}

impl FromStr for DisplayFormat {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(DisplayFormat::Standard),
            "percentage" => Ok(DisplayFormat::Percentage),
            "both" => Ok(DisplayFormat::Both),
            _ => Err(ScheduleError::InvalidSetting(format!(
                "unknown display format `{value}`"
            ))),
        }
    }
}

/// User preferences, persisted under `decha-settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub display_format: DisplayFormat,
    pub show_earth_time: bool,
    pub show_progress_bars: bool,
    pub show_day_context: bool,
    #[serde(rename = "use24HourEarth")]
    pub use_24_hour_earth: bool,
    pub enable_app_badge: bool,
    pub reduced_motion: bool,
    pub enable_hourly_notifications: bool,
    pub notification_frequency: ChimeFrequency,
    pub notification_sound: bool,
    pub quiet_hours_enabled: bool,
    pub quiet_hours_start: DechaHourMinute,
    pub quiet_hours_end: DechaHourMinute,
}

impl Default for Settings {
    fn default() -> Self {
        let quiet = QuietHoursConfig::default();
        Self {
            theme: Theme::Navy,
            display_format: DisplayFormat::Standard,
            show_earth_time: true,
            show_progress_bars: true,
            show_day_context: true,
            use_24_hour_earth: true,
            enable_app_badge: true,
            reduced_motion: false,
            enable_hourly_notifications: false,
            notification_frequency: ChimeFrequency::EveryHour,
            notification_sound: true,
            quiet_hours_enabled: quiet.enabled,
            quiet_hours_start: quiet.start,
            quiet_hours_end: quiet.end,
        }
    }
}

impl Settings {
    pub fn quiet_hours(&self) -> QuietHoursConfig {
        QuietHoursConfig::new(
            self.quiet_hours_enabled,
            self.quiet_hours_start,
            self.quiet_hours_end,
        )
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        for (name, value) in [
            ("quiet hours start", self.quiet_hours_start),
            ("quiet hours end", self.quiet_hours_end),
        ] {
            DechaHourMinute::new(value.hours, value.minutes).map_err(|err| {
                ScheduleError::InvalidSetting(format!("{name}: {err}"))
            })?;
        }
        Ok(())
    }
}

/// Shared settings with write-through persistence.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    inner: Arc<RwLock<Settings>>,
    slot: Slot,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore {
    /// In-memory store holding the defaults.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Settings::default())),
            slot: Slot::detached(SETTINGS_KEY),
        }
    }

    /// Loads persisted settings, falling back to the defaults.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self, ScheduleError> {
        let slot = Slot::attached(kv, SETTINGS_KEY);
        let settings: Settings = slot.load()?.unwrap_or_default();
        settings.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(settings)),
            slot,
        })
    }

    pub fn get(&self) -> Settings {
        self.inner.read().clone()
    }

    pub fn quiet_hours(&self) -> QuietHoursConfig {
        self.inner.read().quiet_hours()
    }

    /// Applies `edit` and persists the result. Edits that fail validation
    /// or cannot be saved are discarded.
    pub fn update<F>(&self, edit: F) -> Result<Settings, ScheduleError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut inner = self.inner.write();
        let mut next = inner.clone();
        edit(&mut next);
        next.validate()?;
        self.slot.save(&next)?;
        *inner = next.clone();
        Ok(next)
    }

    pub fn set_quiet_hours(
        &self,
        start: DechaHourMinute,
        end: DechaHourMinute,
    ) -> Result<Settings, ScheduleError> {
        self.update(|settings| {
            settings.quiet_hours_start = start;
            settings.quiet_hours_end = end;
        })
    }

    pub fn set_quiet_hours_enabled(&self, enabled: bool) -> Result<Settings, ScheduleError> {
        self.update(|settings| settings.quiet_hours_enabled = enabled)
    }

    pub fn set_hourly_chime(
        &self,
        enabled: bool,
        frequency: Option<ChimeFrequency>,
    ) -> Result<Settings, ScheduleError> {
        self.update(|settings| {
            settings.enable_hourly_notifications = enabled;
            if let Some(frequency) = frequency {
                settings.notification_frequency = frequency;
            }
        })
    }

    pub fn reset(&self) -> Result<Settings, ScheduleError> {
        self.update(|settings| *settings = Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::FlakyStore;
    use decha_core::MemoryStore;
    use serde_json::json;

    fn hm(hours: u8, minutes: u8) -> DechaHourMinute {
        DechaHourMinute { hours, minutes }
    }

    #[test]
    fn defaults_match_first_launch() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Navy);
        assert!(settings.use_24_hour_earth);
        assert!(!settings.enable_hourly_notifications);
        let quiet = settings.quiet_hours();
        assert!(!quiet.enabled);
        assert_eq!((quiet.start, quiet.end), (hm(9, 0), hm(2, 0)));
    }

    #[test]
    fn reads_partial_documents() {
        let settings: Settings = serde_json::from_value(json!({
            "theme": "matrix",
            "use24HourEarth": false,
            "quietHoursEnabled": true,
            "enableAnalytics": true
        }))
        .expect("settings");
        assert_eq!(settings.theme, Theme::Matrix);
        assert!(!settings.use_24_hour_earth);
        assert!(settings.quiet_hours().enabled);
        assert_eq!(settings.notification_frequency, ChimeFrequency::EveryHour);
    }

    #[test]
    fn persists_updates() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = SettingsStore::load(Arc::clone(&kv)).expect("load");
        store.set_quiet_hours(hm(8, 50), hm(1, 0)).expect("quiet hours");
        store.set_quiet_hours_enabled(true).expect("enable");
        store
            .set_hourly_chime(true, Some(ChimeFrequency::EveryThreeHours))
            .expect("chime");

        let reloaded = SettingsStore::load(kv).expect("reload");
        let quiet = reloaded.quiet_hours();
        assert!(quiet.enabled);
        assert_eq!(quiet.start, hm(8, 50));
        assert_eq!(reloaded.get().notification_frequency, ChimeFrequency::EveryThreeHours);
    }

    #[test]
    fn rejects_out_of_range_quiet_hours() {
        let store = SettingsStore::new();
        assert!(matches!(
            store.set_quiet_hours(hm(10, 0), hm(2, 0)),
            Err(ScheduleError::InvalidSetting(_))
        ));
        assert_eq!(store.quiet_hours().start, hm(9, 0));
    }

    #[test]
    fn unsaved_update_is_discarded() {
        let kv = Arc::new(FlakyStore::default());
        let store = SettingsStore::load(kv.clone()).expect("load");
        kv.fail_writes(true);
        assert!(matches!(
            store.set_quiet_hours_enabled(true),
            Err(ScheduleError::Storage(_))
        ));
        assert!(!store.quiet_hours().enabled);

        kv.fail_writes(false);
        store.set_quiet_hours_enabled(true).expect("enable");
        assert!(SettingsStore::load(kv).expect("reload").quiet_hours().enabled);
    }

    #[test]
    fn reset_restores_defaults() {
        let store = SettingsStore::new();
        store.update(|s| s.theme = Theme::Cosmic).expect("update");
        assert_eq!(store.reset().expect("reset"), Settings::default());
        assert_eq!("SUNSET".parse::<Theme>().expect("theme"), Theme::Sunset);
        assert!(DisplayFormat::Both.shows_percentage());
    }
}
