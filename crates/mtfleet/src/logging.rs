//! Tracing subscriber setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Filter directive taking precedence over `RUST_LOG`
pub const LOG_ENV: &str = "MTFLEET_LOG";

const LOG_FILE: &str = "mtfleet.log";

/// Pick the filter: `MTFLEET_LOG`, then `RUST_LOG`, then the configured level
fn build_filter(custom: Option<String>, config: &LoggingConfig) -> EnvFilter {
    let fallback = || EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match custom {
        Some(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); using configured level");
            fallback()
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
    }
}

/// Install the global subscriber.
///
/// Logs go to the console and, when `directory` is set, to a daily rolling
/// file. The returned guard flushes the file writer and must be held until
/// the process exits.
///
/// # Errors
/// Returns error if the log directory cannot be created
pub fn init(config: &LoggingConfig) -> eyre::Result<Option<WorkerGuard>> {
    let filter = build_filter(std::env::var(LOG_ENV).ok(), config);

    let console = if config.json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|e| {
                eyre::eyre!("failed to create log directory {}: {e}", directory.display())
            })?;
            let (writer, guard) = tracing_appender::non_blocking(daily(directory, LOG_FILE));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            let layer = if config.json {
                layer.json().boxed()
            } else {
                layer.boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .ok();

    Ok(guard)
}
