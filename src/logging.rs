use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Always writes to a daily rolling file under `log_dir`; `stderr` adds a
/// console layer for the non-interactive commands. The filter comes from
/// `DEVBYTES_LOG` and defaults to `info`. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(log_dir: &Path, stderr: bool) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "devbytes.log"));

  let filter = EnvFilter::try_from_env("DEVBYTES_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(stderr.then(|| fmt::layer().with_writer(std::io::stderr)))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
