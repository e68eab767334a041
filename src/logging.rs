use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

/// Install the global subscriber.
///
/// Stderr always gets events. With `log.file` set, a daily file under
/// `$XDG_DATA_HOME/todo-sync/logs` gets them too; keep the returned guard
/// alive until exit so buffered lines are flushed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    config.level.parse::<EnvFilter>().unwrap_or_else(|e| {
      eprintln!(
        "WARN: log level '{}' is not a valid filter ({}); falling back to 'info'",
        config.level, e
      );
      EnvFilter::new("info")
    })
  });

  let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

  let (file, guard) = if config.file {
    let dir = dirs::data_dir()
      .ok_or_else(|| eyre!("Could not determine data directory for log files"))?
      .join("todo-sync")
      .join("logs");
    std::fs::create_dir_all(&dir)
      .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

    let appender = tracing_appender::rolling::daily(&dir, "todo-sync.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    (Some(layer), Some(guard))
  } else {
    (None, None)
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(stderr)
    .with(file)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
