//! Quiet hours: a DECHA time-of-day window in which notifications are held back.

use serde::{Deserialize, Serialize};

use crate::conversion::DechaHourMinute;

/// Persisted quiet-hours window. Minute granularity, may span midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHoursConfig {
    pub enabled: bool,
    pub start: DechaHourMinute,
    pub end: DechaHourMinute,
}

impl QuietHoursConfig {
    pub fn new(enabled: bool, start: DechaHourMinute, end: DechaHourMinute) -> Self {
        Self {
            enabled,
            start,
            end,
        }
    }

    /// Whether the window wraps past midnight (`start > end`).
    pub fn spans_midnight(&self) -> bool {
        self.start.flat() > self.end.flat()
    }

    pub fn is_active(&self, current: impl Into<DechaHourMinute>) -> bool {
        is_quiet_hours(self.enabled, self.start, self.end, current.into())
    }
}

impl Default for QuietHoursConfig {
    /// Disabled, covering the night from 9:00 to 2:00.
    fn default() -> Self {
        Self {
            enabled: false,
            start: DechaHourMinute {
                hours: 9,
                minutes: 0,
            },
            end: DechaHourMinute {
                hours: 2,
                minutes: 0,
            },
        }
    }
}

/// Decides whether `current` falls inside the quiet window.
///
/// Times are compared as `H*100 + M`. Start is inclusive and end exclusive
/// in both the same-day and the midnight-spanning case. A window with
/// `start == end` is empty.
pub fn is_quiet_hours(
    enabled: bool,
    start: DechaHourMinute,
    end: DechaHourMinute,
    current: DechaHourMinute,
) -> bool {
    if !enabled {
        return false;
    }

    let (start, end, current) = (start.flat(), end.flat(), current.flat());
    if start <= end {
        current >= start && current < end
    } else {
        current >= start || current < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::earth_seconds_to_decha_time;
    use test_case::test_case;

    fn hm(hours: u8, minutes: u8) -> DechaHourMinute {
        DechaHourMinute { hours, minutes }
    }

    #[test_case(hm(2, 0), true ; "inside")]
    #[test_case(hm(1, 0), true ; "start is inclusive")]
    #[test_case(hm(3, 0), false ; "end is exclusive")]
    #[test_case(hm(2, 99), true ; "last minute before end")]
    #[test_case(hm(0, 99), false ; "before start")]
    fn same_day_window(current: DechaHourMinute, expected: bool) {
        assert_eq!(is_quiet_hours(true, hm(1, 0), hm(3, 0), current), expected);
    }

    #[test_case(hm(9, 30), true ; "late evening")]
    #[test_case(hm(1, 30), true ; "after midnight")]
    #[test_case(hm(9, 0), true ; "start is inclusive")]
    #[test_case(hm(2, 0), false ; "end is exclusive")]
    #[test_case(hm(5, 0), false ; "middle of the day")]
    #[test_case(hm(0, 0), true ; "midnight")]
    fn window_spanning_midnight(current: DechaHourMinute, expected: bool) {
        assert_eq!(is_quiet_hours(true, hm(9, 0), hm(2, 0), current), expected);
    }

    #[test]
    fn disabled_is_never_quiet() {
        for flat in (0..1_000).step_by(7) {
            let current = DechaHourMinute::from_flat(flat);
            assert!(!is_quiet_hours(false, hm(9, 0), hm(2, 0), current));
            assert!(!is_quiet_hours(false, hm(0, 0), hm(9, 99), current));
        }
    }

    #[test]
    fn empty_window_is_never_quiet() {
        assert!(!is_quiet_hours(true, hm(4, 0), hm(4, 0), hm(4, 0)));
    }

    #[test]
    fn config_accepts_snapshots() {
        let config = QuietHoursConfig {
            enabled: true,
            ..QuietHoursConfig::default()
        };
        assert!(config.spans_midnight());
        assert!(config.is_active(&earth_seconds_to_decha_time(0.0)));
        assert!(!config.is_active(&earth_seconds_to_decha_time(43_200.0)));
        assert!(!QuietHoursConfig::default().is_active(hm(9, 50)));
    }
}
