//! File logging. Stdout belongs to the renderer while raw mode is on, so
//! events go to a plain log file instead. Filter with `POMO_LOG`
//! (default `info`).

use std::path::Path;
use tracing_appender::{non_blocking::WorkerGuard, rolling::{RollingFileAppender, Rotation}};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Returns the guard that flushes buffered lines on drop; hold it for the
/// life of the process. `None` means logging is off.
pub fn init(path: &Path) -> Option<WorkerGuard> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path.file_name()?.to_string_lossy().into_owned();

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("POMO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(false);

    tracing_subscriber::registry().with(layer).with(filter).try_init().ok()?;
    tracing::info!(log_file = %path.display(), "pomo logging initialized");
    Some(guard)
}
