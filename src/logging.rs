use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Logs go to stderr, or to `log_file` when given so printed tables stay
/// clean. `RUST_LOG` overrides the default `info` level. Keep the returned
/// guard alive until exit or buffered file output is lost.
pub fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let Some(path) = log_file else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_target(true)
      .with_writer(std::io::stderr)
      .try_init()
      .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;
    return Ok(None);
  };

  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .wrap_err_with(|| format!("Failed to open log file {}", path.display()))?;
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(writer)
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  Ok(Some(guard))
}
