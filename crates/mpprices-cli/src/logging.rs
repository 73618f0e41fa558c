use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_PREFIX: &str = "parser";

/// Sets up stderr plus a daily rolling `{logs_dir}/parser.<date>.log`.
///
/// `level` is the default directive; `RUST_LOG` overrides it. The returned
/// guard flushes the file writer on drop and must live until exit.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub(crate) fn init_logging(logs_dir: &Path, level: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let filter = || {
        EnvFilter::builder()
            .with_default_directive(
                level
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            )
            .from_env_lossy()
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(logs_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(filter());
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}
