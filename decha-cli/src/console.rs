use std::io::{self, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use colored::*;
use decha_schedule::{
    Alarm, AlarmRepeat, CalendarEvent, Notification, NotificationSink, ScheduleError, Settings,
    TickOutcome,
};
use decha_time::{
    decha_to_earth_seconds, format_decha_decimal, format_decha_time, format_earth_time,
    format_percentage, ClockSnapshot, DechaClock, DechaTime, EarthTime,
};

const BAR_WIDTH: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Validation(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One line of the `zones` table.
#[derive(Debug, Clone)]
pub struct ZoneRow {
    pub name: String,
    pub label: String,
    pub earth: EarthTime,
    pub decha: DechaClock,
    pub abbreviation: String,
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn print_now(snapshot: &ClockSnapshot, settings: &Settings) {
    let decha = &snapshot.decha;
    if settings.display_format.shows_clock() {
        println!(
            "{} {}  {}",
            "DECHA".cyan().bold(),
            format_decha_time(decha, true).bold(),
            format!("({})", format_decha_decimal(decha)).dimmed()
        );
    }
    if settings.display_format.shows_percentage() {
        println!("      {} of the day", format_percentage(decha).bold());
    }
    if settings.show_earth_time {
        println!(
            "{} {}",
            "Earth".yellow().bold(),
            format_earth_time(&snapshot.earth, settings.use_24_hour_earth)
        );
    }
    if settings.show_day_context {
        let period = decha.day_period();
        println!("{} {}: {}", "Phase".magenta().bold(), period.as_str(), period.description());
    }
    if settings.show_progress_bars {
        print_progress(decha);
    }
}

fn print_progress(decha: &DechaTime) {
    let rows = [
        ("day", decha.percentage),
        ("hour", decha.hour_progress()),
        ("minute", decha.minute_progress()),
    ];
    for (name, value) in rows {
        println!("  {:<6} {} {:>6.2}%", name, progress_bar(value, BAR_WIDTH).cyan(), value);
    }
}

/// Rewrites the current terminal line with the running clock.
pub fn print_clock_line(snapshot: &ClockSnapshot, use_24_hour: bool) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(
        out,
        "\r{} {}  {} {}  {}   ",
        "DECHA".cyan().bold(),
        format_decha_time(&snapshot.decha, true).bold(),
        "Earth".yellow(),
        format_earth_time(&snapshot.earth, use_24_hour),
        format_percentage(&snapshot.decha).dimmed()
    )?;
    out.flush()
}

pub fn print_earth_conversion(earth: &EarthTime, decha: &DechaTime) {
    println!(
        "{} {} → {} {}",
        "Earth".yellow().bold(),
        earth,
        "DECHA".cyan().bold(),
        format_decha_time(decha, true).bold()
    );
    println!("  {} of the day, {}", format_percentage(decha), decha.day_period().as_str());
}

pub fn print_decha_conversion(decha: &DechaClock, earth: &EarthTime) {
    println!(
        "{} {} → {} {}",
        "DECHA".cyan().bold(),
        decha,
        "Earth".yellow().bold(),
        earth.to_string().bold()
    );
    println!("  {}", "rounded down to the whole Earth second".dimmed());
}

pub fn print_zone_rows(rows: &[ZoneRow], use_24_hour: bool) {
    for row in rows {
        println!(
            "{:<26} {:>11}  {:<6} {}",
            row.label,
            format_earth_time(&row.earth, use_24_hour),
            row.abbreviation.dimmed(),
            format_decha_time(&row.decha, true).cyan()
        );
        if row.label != row.name {
            println!("  {}", row.name.dimmed());
        }
    }
}

fn repeat_summary(alarm: &Alarm) -> String {
    if alarm.repeat == AlarmRepeat::Custom {
        const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        let days: Vec<_> = alarm
            .custom_days
            .iter()
            .filter_map(|day| DAYS.get(usize::from(*day)).copied())
            .collect();
        format!("custom ({})", days.join(", "))
    } else {
        alarm.repeat.to_string()
    }
}

pub fn print_alarm_saved(verb: &str, alarm: &Alarm) {
    println!(
        "{} {} at {} (id: {})",
        format!("✔ Alarm {verb}:").green().bold(),
        alarm.label.bold(),
        alarm.decha_time,
        alarm.id
    );
}

pub fn print_alarms(alarms: &[Alarm]) {
    if alarms.is_empty() {
        println!("{}", "No alarms set".dimmed());
        return;
    }
    for alarm in alarms {
        let earth = EarthTime::from_seconds(decha_to_earth_seconds(&alarm.decha_time));
        let state = if alarm.enabled { "on ".green() } else { "off".red() };
        println!(
            "{} {}  {}  {:<20} {:<24} {}",
            state,
            alarm.decha_time.to_string().bold(),
            format!("{:02}:{:02}", earth.hours, earth.minutes).yellow(),
            alarm.label,
            repeat_summary(alarm),
            alarm.id.to_string().dimmed()
        );
        if let Some(last) = alarm.last_triggered {
            println!("      last fired {}", last.to_rfc3339().dimmed());
        }
    }
}

pub fn print_event_saved(verb: &str, event: &CalendarEvent) {
    println!(
        "{} {} on {} at {} (id: {})",
        format!("✔ Event {verb}:").green().bold(),
        event.title.bold(),
        event.date,
        event.decha_start,
        event.id
    );
}

pub fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("{}", "No events".dimmed());
        return;
    }
    for event in events {
        let mark = if event.completed { "✔".green() } else { "·".normal() };
        println!(
            "{} {}  {}–{}  {:<28} {:<9} {}",
            mark,
            event.date,
            event.decha_start.to_string().bold(),
            event.end(),
            event.title,
            event.category.as_str(),
            event.id.dimmed()
        );
        if let Some(description) = &event.description {
            println!("    {description}");
        }
    }
}

pub fn print_quiet_hours(settings: &Settings) {
    let state = if settings.quiet_hours_enabled {
        "enabled".green().bold()
    } else {
        "disabled".red().bold()
    };
    println!(
        "Quiet hours {}: {} → {}",
        state, settings.quiet_hours_start, settings.quiet_hours_end
    );
    let chime = if settings.enable_hourly_notifications {
        format!("every {} DECHA hour(s)", settings.notification_frequency.step())
    } else {
        "off".to_string()
    };
    println!("Hourly chime: {chime}");
}

pub fn print_success(message: &str) {
    println!("{}", format!("✔ {message}").green().bold());
}

pub fn print_tick(outcome: &TickOutcome) {
    if outcome.quiet_hours && !outcome.suppressed.is_empty() {
        println!(
            "\n{}",
            format!("{} alarm(s) silenced by quiet hours", outcome.suppressed.len()).dimmed()
        );
    }
    for note in &outcome.notes {
        eprintln!("\n{} {note}", "warning:".yellow().bold());
    }
}

/// Prints notifications to the terminal, ringing the bell when sound is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn write(notification: &Notification) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        if notification.sound {
            write!(out, "\x07")?;
        }
        writeln!(out, "{}", notification.title.bold().on_blue())?;
        for line in notification.body.lines() {
            writeln!(out, "  {line}")?;
        }
        out.flush()
    }
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), ScheduleError> {
        Self::write(notification).map_err(|err| ScheduleError::Delivery(err.to_string()))
    }
}
