use crate::conversion::{DechaFields, DechaTime};
use crate::earth::EarthTime;

/// `H:MM:SS`, or `H:MM` without seconds. Hours are a single digit.
pub fn format_decha_time(time: &impl DechaFields, include_seconds: bool) -> String {
    if include_seconds {
        format!("{}:{:02}:{:02}", time.hours(), time.minutes(), time.seconds())
    } else {
        format!("{}:{:02}", time.hours(), time.minutes())
    }
}

/// Decimal hours to four places: `H + M/100 + S/10000`.
///
/// Built from the integer fields so the digits are exact.
pub fn format_decha_decimal(time: &impl DechaFields) -> String {
    let fraction = u32::from(time.minutes()) * 100 + u32::from(time.seconds());
    let carry = fraction / 10_000;
    format!(
        "{}.{:04}",
        u32::from(time.hours()) + carry,
        fraction % 10_000
    )
}

/// `HH:MM:SS` on a 24-hour clock, or `HH:MM:SS AM|PM` on a 12-hour clock
/// where hour 0 reads as 12.
pub fn format_earth_time(time: &EarthTime, use_24_hour: bool) -> String {
    if use_24_hour {
        return time.to_string();
    }
    let suffix = if time.hours >= 12 { "PM" } else { "AM" };
    let hours = match time.hours % 12 {
        0 => 12,
        h => h,
    };
    format!(
        "{:02}:{:02}:{:02} {}",
        hours, time.minutes, time.seconds, suffix
    )
}

/// Fraction of the day elapsed, two decimals.
pub fn format_percentage(time: &DechaTime) -> String {
    format!("{:.2}%", time.percentage)
}
