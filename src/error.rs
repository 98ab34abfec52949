use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

use crate::calculator::CalcError;

/// Error severity for presentation-layer display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable, results may be incomplete
    Error,    // operation failed
    Critical, // requires user action
}

/// Domain-specific errors for the launcher core
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Usage store I/O failed for '{path}': {source}")]
    UsageStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse usage data: {0}")]
    UsageParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Provider '{provider}' panicked")]
    ProviderPanicked { provider: String },

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalcError),

    #[error("Action failed: {0}")]
    Action(String),

    #[error("Usage persistence worker is not running")]
    WorkerStopped,
}

impl LauncherError {
    pub fn usage_store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::UsageStore {
            path: path.into(),
            source,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UsageStore { .. } => ErrorSeverity::Warning,
            Self::UsageParse(_) => ErrorSeverity::Warning,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Provider { .. } => ErrorSeverity::Info,
            Self::ProviderPanicked { .. } => ErrorSeverity::Warning,
            Self::Calculation(_) => ErrorSeverity::Info,
            Self::Action(_) => ErrorSeverity::Error,
            Self::WorkerStopped => ErrorSeverity::Critical,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::UsageStore { path, .. } => {
                format!("Could not save usage history to {}", path.display())
            }
            Self::UsageParse(_) => "Usage history was unreadable and has been reset".to_string(),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Provider { provider, .. } | Self::ProviderPanicked { provider } => {
                format!("Some {} results are unavailable", provider)
            }
            Self::Calculation(e) => e.to_string(),
            Self::Action(msg) => msg.clone(),
            Self::WorkerStopped => "Usage history can no longer be saved".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use quicklaunch_core::error::ResultExt;
///
/// // Keep going with an empty catalog if a directory can't be read
/// let entries = std::fs::read_dir(dir).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_are_low_severity() {
        let err = LauncherError::Provider {
            provider: "applications".to_string(),
            message: "catalog unavailable".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert!(err.to_string().contains("applications"));
        assert!(err.user_message().contains("applications"));
    }

    #[test]
    fn test_usage_store_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = LauncherError::usage_store("/tmp/usage.json", io);
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.user_message().contains("/tmp/usage.json"));
    }

    #[test]
    fn test_calc_error_converts() {
        let err: LauncherError = CalcError::DivisionByZero.into();
        assert!(matches!(err, LauncherError::Calculation(_)));
    }

    #[test]
    fn test_result_ext_passes_through_ok() {
        let ok: std::result::Result<u8, String> = Ok(7);
        assert_eq!(ok.log_err(), Some(7));
        let err: std::result::Result<u8, String> = Err("boom".to_string());
        assert_eq!(err.warn_on_err(), None);
    }
}
