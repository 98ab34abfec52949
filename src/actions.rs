//! Candidate activation
//!
//! Activation records the selection with the dispatcher first, then runs
//! the action. Opening URLs, paths and applications happens here through
//! the `open` crate; window placement, settings panes, clipboard copies and
//! launcher-internal commands belong to the platform layer and come back as
//! [`ActionOutcome::Delegated`].

use std::path::Path;

use tracing::{debug, info};

use crate::candidate::{Candidate, CandidateAction};
use crate::dispatcher::QueryDispatcher;
use crate::error::{LauncherError, Result};

/// What happened when an action ran
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// A URL, file, folder or application was handed to the OS
    Opened { target: String },
    /// The host must carry this action out
    Delegated(CandidateAction),
}

pub trait ActionExecutor: Send + Sync {
    fn execute(&self, action: &CandidateAction) -> Result<ActionOutcome>;
}

/// Opens targets with the platform's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemActionExecutor;

impl SystemActionExecutor {
    fn open(target: &str) -> Result<ActionOutcome> {
        info!(target, "Opening");
        open::that_detached(target)
            .map_err(|e| LauncherError::Action(format!("Failed to open {}: {}", target, e)))?;
        Ok(ActionOutcome::Opened {
            target: target.to_string(),
        })
    }

    fn open_path(path: &Path) -> Result<ActionOutcome> {
        Self::open(&path.to_string_lossy())
    }
}

impl ActionExecutor for SystemActionExecutor {
    fn execute(&self, action: &CandidateAction) -> Result<ActionOutcome> {
        match action {
            CandidateAction::LaunchApp { path } | CandidateAction::OpenPath { path } => {
                Self::open_path(path)
            }
            CandidateAction::OpenUrl { url } => Self::open(url),
            CandidateAction::Unavailable { reason } => Err(LauncherError::Action(reason.clone())),
            CandidateAction::OpenSettingsPane { .. }
            | CandidateAction::PlaceWindow { .. }
            | CandidateAction::Internal { .. }
            | CandidateAction::CopyText { .. } => {
                debug!(?action, "Delegating action to host");
                Ok(ActionOutcome::Delegated(action.clone()))
            }
        }
    }
}

/// Record the selection of `candidate`, then execute its action.
///
/// Unavailable candidates are neither recorded nor executed.
pub fn activate(
    dispatcher: &QueryDispatcher,
    executor: &dyn ActionExecutor,
    candidate: &Candidate,
) -> Result<ActionOutcome> {
    if let CandidateAction::Unavailable { reason } = &candidate.action {
        return Err(LauncherError::Action(reason.clone()));
    }
    dispatcher.record_selection(&candidate.id, candidate.kind);
    executor.execute(&candidate.action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateKind, InternalCommand};
    use crate::config::UsageConfig;
    use crate::providers::window_placement::TilePosition;
    use crate::providers::AppCatalog;
    use crate::running::StaticRunningApps;
    use crate::usage::{MemoryPersistence, UsageTracker};
    use crate::dispatcher::DispatchOptions;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records what it was asked to run and whether usage was already recorded
    struct RecordingExecutor {
        usage: Arc<UsageTracker>,
        calls: Mutex<Vec<(CandidateAction, bool)>>,
    }

    impl ActionExecutor for RecordingExecutor {
        fn execute(&self, action: &CandidateAction) -> Result<ActionOutcome> {
            let recorded = !self.usage.is_empty();
            self.calls.lock().push((action.clone(), recorded));
            Ok(ActionOutcome::Delegated(action.clone()))
        }
    }

    fn dispatcher() -> QueryDispatcher {
        let usage = Arc::new(UsageTracker::with_persistence(
            &UsageConfig::default(),
            Box::new(MemoryPersistence::new()),
        ));
        QueryDispatcher::new(
            Vec::new(),
            usage,
            Arc::new(AppCatalog::with_apps(Vec::new())),
            Arc::new(StaticRunningApps::default()),
            DispatchOptions::default(),
        )
    }

    fn url_candidate() -> Candidate {
        Candidate::new(
            "web-search-google",
            "Search Google",
            "",
            CandidateKind::WebSuggestion,
            CandidateAction::OpenUrl {
                url: "https://www.google.com/search?q=x".to_string(),
            },
        )
    }

    #[test]
    fn test_selection_is_recorded_before_execution() {
        let dispatcher = dispatcher();
        let executor = RecordingExecutor {
            usage: dispatcher.usage().clone(),
            calls: Mutex::new(Vec::new()),
        };

        activate(&dispatcher, &executor, &url_candidate()).unwrap();

        let calls = executor.calls.lock();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1, "usage must be recorded before the action runs");
        assert_eq!(dispatcher.usage().get("web-search-google").unwrap().count, 1);
    }

    #[test]
    fn test_unavailable_candidate_is_rejected() {
        let dispatcher = dispatcher();
        let executor = RecordingExecutor {
            usage: dispatcher.usage().clone(),
            calls: Mutex::new(Vec::new()),
        };
        let candidate = Candidate::new(
            "calculator-result",
            "Invalid expression",
            "",
            CandidateKind::Calculation,
            CandidateAction::Unavailable {
                reason: "division by zero".to_string(),
            },
        );

        let err = activate(&dispatcher, &executor, &candidate).unwrap_err();
        assert!(matches!(err, LauncherError::Action(_)));
        assert!(executor.calls.lock().is_empty());
        assert!(dispatcher.usage().is_empty());
    }

    #[test]
    fn test_platform_actions_are_delegated() {
        let executor = SystemActionExecutor;
        for action in [
            CandidateAction::PlaceWindow {
                position: TilePosition::LeftHalf,
            },
            CandidateAction::Internal {
                command: InternalCommand::Quit,
            },
            CandidateAction::CopyText {
                text: "8".to_string(),
            },
            CandidateAction::OpenSettingsPane {
                pane: "com.apple.preference.displays".to_string(),
            },
        ] {
            assert_eq!(
                executor.execute(&action).unwrap(),
                ActionOutcome::Delegated(action.clone())
            );
        }
    }

    #[test]
    fn test_system_executor_rejects_unavailable() {
        let action = CandidateAction::Unavailable {
            reason: "nope".to_string(),
        };
        let err = SystemActionExecutor.execute(&action).unwrap_err();
        assert_eq!(err.user_message(), "nope");
    }
}
