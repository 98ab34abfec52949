//! Structured JSONL logging plus compact stderr output.
//!
//! - **JSONL to file** (`<data dir>/quicklaunch/logs/quicklaunch.jsonl`)
//! - **Compact to stderr**, for whoever is watching the terminal
//!
//! ```rust,ignore
//! let _guard = quicklaunch_core::logging::init();
//! tracing::info!(event_type = "dispatch", "Ready");
//! ```
//!
//! `RUST_LOG` overrides the default filter.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "quicklaunch.jsonl";
const DEFAULT_FILTER: &str = "info";

/// Keep alive for the duration of the program; dropping it flushes the file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize file and stderr logging.
///
/// If the log file cannot be opened, the JSON layer writes to a sink and
/// only stderr output is produced.
pub fn init() -> LoggingGuard {
    let path = log_path();
    let (writer, file_guard) = match open_log_file(&path) {
        Some(file) => tracing_appender::non_blocking(file),
        None => tracing_appender::non_blocking(std::io::sink()),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer(writer))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("[LOGGING] Subscriber already installed: {}", e);
    }

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn json_layer<S>(writer: NonBlocking) -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_writer(writer)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("[LOGGING] Failed to create log directory {}: {}", dir.display(), e);
            return None;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eprintln!("[LOGGING] Failed to open log file {}: {}", path.display(), e))
        .ok()
}

/// Location of the JSONL log file
pub fn log_path() -> PathBuf {
    log_dir().join(LOG_FILE_NAME)
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("quicklaunch").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("quicklaunch-logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_jsonl_under_logs_dir() {
        let path = log_path();
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
        assert!(path.parent().unwrap().ends_with("logs"));
    }

    #[test]
    fn test_unwritable_location_yields_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        assert!(open_log_file(&blocker.join("nested").join(LOG_FILE_NAME)).is_none());
    }
}
