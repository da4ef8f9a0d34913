//! DECHA time domain.
//!
//! A DECHA day has 10 hours of 100 minutes of 100 seconds, 100 000 DECHA
//! seconds in total, so one DECHA second lasts 0.864 Earth seconds. This
//! crate maps Earth wall-clock readings onto that decimal clock and back,
//! classifies the day period, formats both clocks, evaluates quiet-hour
//! windows and projects Earth times onto other IANA timezones.
//!
//! Everything here is a pure function of its inputs except [`clock::SystemClock`],
//! which reads the host clock.

pub mod clock;
pub mod conversion;
pub mod earth;
pub mod error;
pub mod format;
pub mod period;
pub mod quiet;
pub mod timezone;

pub use clock::{Clock, ClockSnapshot, FixedClock, SystemClock};
pub use conversion::{
    calculate_progress, decha_to_earth_seconds, earth_seconds_to_decha_time, DechaClock, DechaFields,
    DechaHourMinute, DechaTime, DECHA_SECONDS_PER_DAY, EARTH_SECONDS_PER_DAY,
    EARTH_SECONDS_PER_DECHA_SECOND,
};
pub use earth::{earth_seconds_since_midnight, EarthTime};
pub use error::TimeError;
pub use format::{format_decha_decimal, format_decha_time, format_earth_time, format_percentage};
pub use period::{get_day_period, DayPeriod};
pub use quiet::{is_quiet_hours, QuietHoursConfig};
pub use timezone::{
    abbreviation, parse_timezone, popular_timezones, project_instant, utc_offset, TimezoneInfo,
    TimezoneProjector,
};
