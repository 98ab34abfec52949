//! Launcher commands that appear in the main search
//!
//! Each entry carries an alias list so "exit" and "terminate" find Quit.

use tracing::debug;

use super::{score_static_entries, QueryContext, ResultProvider, StaticEntry};
use crate::candidate::{CandidateAction, CandidateKind, InternalCommand, Query, ScoredCandidate};

/// Identifier of the quit command (excluded from usage history by default)
pub const QUIT_ID: &str = "builtin-quit";

fn builtin_entries() -> Vec<StaticEntry> {
    let entries = vec![
        StaticEntry::new(
            "builtin-preferences",
            "Launcher Preferences",
            "Open the launcher settings",
            &["settings", "preferences", "config", "options", "configure"],
            CandidateKind::Command,
            CandidateAction::Internal {
                command: InternalCommand::OpenPreferences,
            },
        ),
        StaticEntry::new(
            "builtin-clear-usage",
            "Clear Usage History",
            "Forget how often results were picked",
            &["clear", "reset", "history", "forget", "usage"],
            CandidateKind::Command,
            CandidateAction::Internal {
                command: InternalCommand::ClearUsage,
            },
        ),
        StaticEntry::new(
            QUIT_ID,
            "Quit Launcher",
            "Close the launcher completely",
            &["quit", "exit", "terminate", "close"],
            CandidateKind::Command,
            CandidateAction::Internal {
                command: InternalCommand::Quit,
            },
        ),
    ];
    debug!(count = entries.len(), "Built launcher command entries");
    entries
}

pub struct BuiltinsProvider {
    entries: Vec<StaticEntry>,
}

impl BuiltinsProvider {
    pub fn new() -> Self {
        BuiltinsProvider {
            entries: builtin_entries(),
        }
    }
}

impl Default for BuiltinsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultProvider for BuiltinsProvider {
    fn name(&self) -> &'static str {
        "system-commands"
    }

    fn provide(&self, query: &Query, context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        Ok(score_static_entries(&self.entries, query, context))
    }
}
