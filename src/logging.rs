use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "crawler.log";
const DEFAULT_FILTER: &str = "ticket_crawler=debug,info";

/// Installs the global subscriber: JSON lines into `logs/crawler.log.<date>`
/// plus readable output on stderr. `RUST_LOG` replaces the default filter.
///
/// Buffered file output is flushed when the returned guard drops, so hold it
/// until the end of `main`.
pub fn init_logging() -> WorkerGuard {
    init_logging_in(Path::new(LOG_DIR))
}

fn init_logging_in(dir: &Path) -> WorkerGuard {
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("cannot create {}: {e}", dir.display());
    }

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    // stdout carries the printed records
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let json_layer = fmt::layer().json().with_writer(file_writer);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
