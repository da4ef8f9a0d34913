use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{DechaError, Result};

/// Installs the stderr subscriber shared by the DECHA binaries.
///
/// `RUST_LOG` wins over `level` when it is set. Output goes to stderr so
/// command output on stdout stays clean.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    SubscriberBuilder::default()
        .with_env_filter(build_filter(level)?)
        .with_target(true)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| DechaError::GeneralError(err.to_string()))?;

    Ok(())
}

fn build_filter(level: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = level.map(str::trim).filter(|raw| !raw.is_empty()).unwrap_or("info");
    EnvFilter::try_new(directives)
        .map_err(|err| DechaError::ConfigError(format!("invalid log filter {directives:?}: {err}")))
}
