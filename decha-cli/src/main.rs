use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use decha_core::logging::init_tracing;
use decha_core::{load_core_config, JsonFileStore, KeyValueStore};
use decha_schedule::{
    load_alarms, load_events, AlarmDraft, AlarmId, AlarmPoller, AlarmRepeat, AlarmStore,
    CalendarStore, ChimeFrequency, EventCategory, EventDraft, EventRepeat, SettingsStore,
};
use decha_time::{
    abbreviation, decha_to_earth_seconds, earth_seconds_to_decha_time, parse_timezone,
    popular_timezones, project_instant, Clock, DechaClock, DechaHourMinute, EarthTime,
    SystemClock, TimezoneProjector,
};
use tracing::debug;

mod console;

use console::{
    print_alarm_saved, print_alarms, print_clock_line, print_decha_conversion,
    print_earth_conversion, print_event_saved, print_events, print_now, print_quiet_hours,
    print_success, print_tick, print_zone_rows, CliError, ConsoleSink, ZoneRow,
};

#[derive(Parser)]
#[command(name = "decha")]
#[command(about = "DECHA decimal clock - conversion, alarms and quiet hours", long_about = None)]
struct Cli {
    /// Directory holding alarms, settings and calendar events
    #[arg(long, global = true, env = "DECHA_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "DECHA_LOG")]
    log: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current DECHA and Earth time
    Now {
        /// Print the clock snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Convert between Earth and DECHA times of day
    #[command(subcommand)]
    Convert(ConvertCommands),
    /// Show an Earth time in other timezones
    Zones(ZonesArgs),
    /// Manage alarms
    #[command(subcommand)]
    Alarm(AlarmCommands),
    /// Manage calendar events
    #[command(subcommand)]
    Event(EventCommands),
    /// Configure quiet hours
    #[command(subcommand)]
    Quiet(QuietCommands),
    /// Configure the hourly chime
    #[command(subcommand)]
    Chime(ChimeCommands),
    /// Run the clock and ring alarms until interrupted
    Watch(WatchArgs),
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConvertCommands {
    /// Earth HH:MM[:SS] to DECHA
    Earth { time: EarthTime },
    /// DECHA H:MM[:SS] to Earth
    Decha { time: DechaClock },
}

#[derive(Args)]
struct ZonesArgs {
    /// IANA timezones to show (defaults to a list of popular zones)
    zones: Vec<String>,
    /// Earth time to project instead of the current instant
    #[arg(long)]
    at: Option<EarthTime>,
    /// Date the `--at` time is read on (defaults to today)
    #[arg(long, requires = "at")]
    date: Option<NaiveDate>,
    /// Timezone the `--at` time is read in (defaults to the local zone)
    #[arg(long, requires = "at")]
    from: Option<String>,
}

#[derive(Subcommand)]
enum AlarmCommands {
    /// Add an alarm at a DECHA time
    Add(AlarmAddArgs),
    /// List alarms ordered by trigger time
    List,
    /// Delete an alarm
    Remove { id: String },
    /// Enable or disable an alarm
    Toggle { id: String },
    /// Push an alarm later by a number of DECHA minutes
    Snooze {
        id: String,
        #[arg(long, default_value_t = 10)]
        minutes: u32,
    },
    /// Write all alarms as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace all alarms with the ones in a JSON or YAML file
    Import { path: PathBuf },
}

#[derive(Args)]
struct AlarmAddArgs {
    /// DECHA time, H:MM[:SS]
    time: DechaClock,
    #[arg(long, default_value = "Alarm")]
    label: String,
    /// once, daily, weekdays, weekends or custom
    #[arg(long, default_value = "once")]
    repeat: AlarmRepeat,
    /// Days for custom alarms, Sunday = 0 (e.g. 1,3,5)
    #[arg(long, value_delimiter = ',')]
    days: Vec<u8>,
    /// Deliver without sound
    #[arg(long, default_value_t = false)]
    silent: bool,
}

#[derive(Subcommand)]
enum EventCommands {
    /// Schedule an event at a DECHA time
    Add(EventAddArgs),
    /// List events for a day or a week
    List {
        /// Day to list (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// List seven days starting at the date
        #[arg(long, default_value_t = false)]
        week: bool,
    },
    /// Toggle the completed flag of an event
    Done { id: String },
    /// Delete an event
    Remove { id: String },
    /// Write all events as JSON
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace all events with the ones in a JSON or YAML file
    Import { path: PathBuf },
}

#[derive(Args)]
struct EventAddArgs {
    title: String,
    /// DECHA start time, H:MM
    #[arg(long)]
    start: DechaHourMinute,
    /// Duration in DECHA minutes
    #[arg(long, default_value_t = 100)]
    duration: u32,
    /// Defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// work, personal, health or other
    #[arg(long, default_value = "work")]
    category: EventCategory,
    /// none, daily, weekly or monthly
    #[arg(long, default_value = "none")]
    repeat: EventRepeat,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Subcommand)]
enum QuietCommands {
    /// Show quiet hours and chime settings
    Show,
    /// Set the quiet window, DECHA H:MM to H:MM
    Set {
        start: DechaHourMinute,
        end: DechaHourMinute,
    },
    /// Enable quiet hours
    On,
    /// Disable quiet hours
    Off,
}

#[derive(Subcommand)]
enum ChimeCommands {
    /// Chime at the top of DECHA hours
    On {
        /// Every 1, 2 or 3 DECHA hours
        #[arg(long)]
        every: Option<ChimeFrequency>,
    },
    /// Stop chiming
    Off,
}

#[derive(Args)]
struct WatchArgs {
    /// Polling period in milliseconds (overrides DECHA_POLL_INTERVAL_MS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(50..=5_000))]
    interval_ms: Option<u64>,
    /// Only print notifications, not the running clock
    #[arg(long, default_value_t = false)]
    no_clock: bool,
}

struct Stores {
    alarms: AlarmStore,
    settings: SettingsStore,
    calendar: CalendarStore,
}

impl Stores {
    fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            JsonFileStore::open(data_dir)
                .with_context(|| format!("opening data directory {}", data_dir.display()))?,
        );
        debug!(data_dir = %data_dir.display(), "opened key-value store");
        Ok(Self {
            alarms: AlarmStore::load(Arc::clone(&kv))?,
            settings: SettingsStore::load(Arc::clone(&kv))?,
            calendar: CalendarStore::load(kv)?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_core_config()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let level = cli.log.unwrap_or_else(|| config.log_level.clone());
    init_tracing(Some(level.as_str()))?;

    match cli.command {
        Commands::Version => {
            println!("DECHA clock v{}", env!("CARGO_PKG_VERSION"));
            println!("100 000 DECHA seconds per day");
        }
        Commands::Convert(ConvertCommands::Earth { time }) => {
            let decha = earth_seconds_to_decha_time(f64::from(time.seconds_since_midnight()));
            print_earth_conversion(&time, &decha);
        }
        Commands::Convert(ConvertCommands::Decha { time }) => {
            let earth = EarthTime::from_seconds(decha_to_earth_seconds(&time));
            print_decha_conversion(&time, &earth);
        }
        command => {
            let stores = Stores::open(config.data_dir())?;
            let settings = stores.settings.get();

            match command {
                Commands::Now { json } => {
                    let snapshot = SystemClock.snapshot();
                    if json {
                        println!("{}", serde_json::to_string_pretty(&snapshot)?);
                    } else {
                        print_now(&snapshot, &settings);
                    }
                }
                Commands::Zones(args) => {
                    let rows = zone_rows(&args)?;
                    print_zone_rows(&rows, settings.use_24_hour_earth);
                }
                Commands::Alarm(command) => run_alarm(&stores.alarms, command)?,
                Commands::Event(command) => run_event(&stores.calendar, command)?,
                Commands::Quiet(command) => {
                    let updated = match command {
                        QuietCommands::Show => settings,
                        QuietCommands::Set { start, end } => {
                            stores.settings.set_quiet_hours(start, end)?
                        }
                        QuietCommands::On => stores.settings.set_quiet_hours_enabled(true)?,
                        QuietCommands::Off => stores.settings.set_quiet_hours_enabled(false)?,
                    };
                    print_quiet_hours(&updated);
                }
                Commands::Chime(command) => {
                    let updated = match command {
                        ChimeCommands::On { every } => stores.settings.set_hourly_chime(true, every)?,
                        ChimeCommands::Off => stores.settings.set_hourly_chime(false, None)?,
                    };
                    print_quiet_hours(&updated);
                }
                Commands::Watch(args) => {
                    let period = args
                        .interval_ms
                        .map(Duration::from_millis)
                        .unwrap_or(config.poll_interval);
                    watch(stores, period, !args.no_clock).await?;
                }
                Commands::Version | Commands::Convert(_) => {}
            }
        }
    }

    Ok(())
}

fn zone_rows(args: &ZonesArgs) -> anyhow::Result<Vec<ZoneRow>> {
    let instant: DateTime<Utc> = match args.at {
        Some(earth) => {
            let date = args.date.unwrap_or_else(|| Local::now().date_naive());
            match &args.from {
                Some(label) => TimezoneProjector::new(parse_timezone(label)?).resolve(date, &earth)?,
                None => TimezoneProjector::new(Local).resolve(date, &earth)?,
            }
        }
        None => Utc::now(),
    };

    let targets: Vec<(String, String)> = if args.zones.is_empty() {
        popular_timezones()
            .iter()
            .map(|zone| (zone.name.to_string(), zone.label.to_string()))
            .collect()
    } else {
        args.zones.iter().map(|zone| (zone.clone(), zone.clone())).collect()
    };

    targets
        .into_iter()
        .map(|(name, label)| {
            let tz = parse_timezone(&name)?;
            let earth = project_instant(&instant, tz);
            let decha = earth_seconds_to_decha_time(f64::from(earth.seconds_since_midnight()));
            Ok(ZoneRow {
                abbreviation: abbreviation(&instant, tz),
                decha: decha.clock(),
                earth,
                name,
                label,
            })
        })
        .collect()
}

fn run_alarm(alarms: &AlarmStore, command: AlarmCommands) -> anyhow::Result<()> {
    match command {
        AlarmCommands::Add(args) => {
            let mut draft = AlarmDraft::new(args.time, args.label)
                .repeat(args.repeat)
                .sound(!args.silent);
            if !args.days.is_empty() {
                if !matches!(args.repeat, AlarmRepeat::Once | AlarmRepeat::Custom) {
                    return Err(CliError::Validation(format!(
                        "--days cannot be combined with --repeat {}",
                        args.repeat
                    ))
                    .into());
                }
                draft = draft.custom_days(args.days);
            }
            let alarm = alarms.add(draft, Utc::now())?;
            print_alarm_saved("added", &alarm);
        }
        AlarmCommands::List => print_alarms(&alarms.list()),
        AlarmCommands::Remove { id } => {
            let alarm = alarms.delete(&AlarmId::from(id))?;
            print_alarm_saved("removed", &alarm);
        }
        AlarmCommands::Toggle { id } => {
            let alarm = alarms.toggle(&AlarmId::from(id))?;
            let verb = if alarm.enabled { "enabled" } else { "disabled" };
            print_alarm_saved(verb, &alarm);
        }
        AlarmCommands::Snooze { id, minutes } => {
            let alarm = alarms.snooze(&AlarmId::from(id), minutes)?;
            print_alarm_saved("snoozed", &alarm);
        }
        AlarmCommands::Export { output } => write_export(&alarms.export_json()?, output.as_deref())?,
        AlarmCommands::Import { path } => {
            let imported = load_alarms(&path)?;
            let count = alarms.replace_all(imported)?;
            print_success(&format!("Imported {count} alarm(s) from {}", path.display()));
        }
    }
    Ok(())
}

fn run_event(calendar: &CalendarStore, command: EventCommands) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    match command {
        EventCommands::Add(args) => {
            let mut draft = EventDraft::new(
                args.title,
                args.date.unwrap_or(today),
                args.start,
                args.duration,
            )
            .category(args.category);
            draft.repeat = args.repeat;
            if let Some(description) = args.description {
                draft = draft.description(description);
            }
            let event = calendar.add(draft, Utc::now())?;
            print_event_saved("added", &event);
        }
        EventCommands::List { date, week } => {
            let date = date.unwrap_or(today);
            let events = if week {
                calendar.events_for_week(date)
            } else {
                calendar.events_for_date(date)
            };
            print_events(&events);
        }
        EventCommands::Done { id } => {
            let event = calendar.toggle_complete(&id)?;
            let verb = if event.completed { "completed" } else { "reopened" };
            print_event_saved(verb, &event);
        }
        EventCommands::Remove { id } => {
            let event = calendar.delete(&id)?;
            print_event_saved("removed", &event);
        }
        EventCommands::Export { output } => {
            write_export(&calendar.export_json()?, output.as_deref())?
        }
        EventCommands::Import { path } => {
            let imported = load_events(&path)?;
            let count = calendar.replace_all(imported)?;
            print_success(&format!("Imported {count} event(s) from {}", path.display()));
        }
    }
    Ok(())
}

fn write_export(json: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            fs::write(path, json).map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            print_success(&format!("Exported to {}", path.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn watch(stores: Stores, period: Duration, show_clock: bool) -> anyhow::Result<()> {
    let settings = stores.settings.clone();
    let mut poller = AlarmPoller::new(
        stores.alarms,
        stores.settings,
        Arc::new(SystemClock),
        Arc::new(ConsoleSink),
    );

    poller
        .run_until(period, tokio::signal::ctrl_c(), |snapshot, outcome| {
            print_tick(outcome);
            if show_clock {
                print_clock_line(snapshot, settings.get().use_24_hour_earth)?;
            }
            Ok(())
        })
        .await
        .context("watching alarms")?;
    println!();

    Ok(())
}
