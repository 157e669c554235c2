use eyre::{Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::LogsConfig;

/// File name prefix for daily-rotated log files
const LOG_FILE_PREFIX: &str = "spill-relay.log";

/// Install the global tracing subscriber.
///
/// Logs go to stdout (text or JSON) and, when `log_dir` is set, to a daily
/// rotated JSON file. The returned guard must be held for the life of the
/// process or buffered file output is lost.
pub fn initialize_tracing_log(settings: &LogsConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&settings.level, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    let stdout_layer = if settings.json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file_layer, guard) = match &settings.log_dir {
        Some(log_dir) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// `RUST_LOG` wins over the configured level when present
fn env_filter(default_level: &str, rust_log: Option<String>) -> Result<EnvFilter> {
    let directives = rust_log.unwrap_or_else(|| default_level.to_string());
    EnvFilter::try_new(&directives).wrap_err_with(|| format!("Invalid log filter '{directives}'"))
}
