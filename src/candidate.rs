//! Search result data model
//!
//! A [`Candidate`] is produced by a provider, paired with its combined
//! score as a [`ScoredCandidate`] for one aggregation round, and handed to
//! the presentation layer as part of [`RankedResults`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::providers::window_placement::TilePosition;
use crate::usage::UsageKind;

/// Query text captured once per aggregation round
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    raw: String,
    lower: String,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lower = raw.trim().to_lowercase();
        Query { raw, lower }
    }

    /// The text exactly as typed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, lower-cased text used for matching
    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn is_blank(&self) -> bool {
        self.lower.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateKind {
    Program,
    Command,
    WindowPlacement,
    Shortcut,
    Calculation,
    WebSuggestion,
}

impl CandidateKind {
    /// Category used when a selection of this kind is recorded
    pub fn usage_kind(self) -> UsageKind {
        match self {
            CandidateKind::Program => UsageKind::Application,
            CandidateKind::WebSuggestion => UsageKind::WebSearch,
            CandidateKind::Command
            | CandidateKind::WindowPlacement
            | CandidateKind::Shortcut
            | CandidateKind::Calculation => UsageKind::Command,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CandidateKind::Program => "Application",
            CandidateKind::Command => "Command",
            CandidateKind::WindowPlacement => "Window",
            CandidateKind::Shortcut => "Shortcut",
            CandidateKind::Calculation => "Calculator",
            CandidateKind::WebSuggestion => "Web Search",
        }
    }
}

/// Launcher-internal commands handled by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InternalCommand {
    OpenPreferences,
    ClearUsage,
    Quit,
}

/// What happens when a candidate is activated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CandidateAction {
    /// Launch an installed application
    LaunchApp { path: PathBuf },
    OpenUrl { url: String },
    OpenPath { path: PathBuf },
    /// Open an operating system settings pane by URL/identifier
    OpenSettingsPane { pane: String },
    PlaceWindow { position: TilePosition },
    Internal { command: InternalCommand },
    /// Copy a calculation result
    CopyText { text: String },
    /// The candidate cannot be activated (e.g. an expression that failed to evaluate)
    Unavailable { reason: String },
}

/// One actionable search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Stable key used for usage tracking and deduplication
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub kind: CandidateKind,
    /// Text relevance in [0, 1], before usage is blended in
    pub match_score: f64,
    pub action: CandidateAction,
    /// Program is currently running
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub running: bool,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        kind: CandidateKind,
        action: CandidateAction,
    ) -> Self {
        Candidate {
            id: id.into(),
            title: title.into(),
            subtitle: subtitle.into(),
            kind,
            match_score: 0.0,
            action,
            running: false,
        }
    }

    pub fn with_match_score(mut self, match_score: f64) -> Self {
        self.match_score = match_score;
        self
    }

    pub fn with_running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    /// Whether activating this candidate does anything
    pub fn is_actionable(&self) -> bool {
        !matches!(self.action, CandidateAction::Unavailable { .. })
    }
}

/// A candidate with its combined score, valid for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn new(candidate: Candidate, score: f64) -> Self {
        ScoredCandidate { candidate, score }
    }
}

/// The published output of one aggregation round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResults {
    /// Monotonic round number that produced these results
    pub round: u64,
    pub query: String,
    /// Ranked, truncated results followed by fallback entries
    pub items: Vec<ScoredCandidate>,
    /// Number of leading `items` that were ranked (the rest are fallbacks)
    pub ranked_len: usize,
}

impl RankedResults {
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter().map(|item| &item.candidate)
    }

    pub fn ranked(&self) -> &[ScoredCandidate] {
        &self.items[..self.ranked_len.min(self.items.len())]
    }

    pub fn fallbacks(&self) -> &[ScoredCandidate] {
        &self.items[self.ranked_len.min(self.items.len())..]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalizes_once() {
        let query = Query::new("  Chrom ");
        assert_eq!(query.raw(), "  Chrom ");
        assert_eq!(query.lower(), "chrom");
        assert!(!query.is_blank());
        assert!(Query::new("   ").is_blank());
    }

    #[test]
    fn test_kind_to_usage_kind() {
        assert_eq!(CandidateKind::Program.usage_kind(), UsageKind::Application);
        assert_eq!(
            CandidateKind::WebSuggestion.usage_kind(),
            UsageKind::WebSearch
        );
        assert_eq!(
            CandidateKind::WindowPlacement.usage_kind(),
            UsageKind::Command
        );
        assert_eq!(CandidateKind::Shortcut.usage_kind(), UsageKind::Command);
    }

    #[test]
    fn test_action_serializes_tagged() {
        let action = CandidateAction::OpenUrl {
            url: "https://example.com".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "openUrl");
        assert_eq!(json["url"], "https://example.com");
    }

    #[test]
    fn test_unavailable_candidate_not_actionable() {
        let candidate = Candidate::new(
            "calc",
            "Error",
            "division by zero",
            CandidateKind::Calculation,
            CandidateAction::Unavailable {
                reason: "division by zero".to_string(),
            },
        );
        assert!(!candidate.is_actionable());
    }

    #[test]
    fn test_ranked_results_split() {
        let make = |id: &str| {
            ScoredCandidate::new(
                Candidate::new(
                    id,
                    id,
                    "",
                    CandidateKind::Command,
                    CandidateAction::Internal {
                        command: InternalCommand::Quit,
                    },
                ),
                0.5,
            )
        };
        let results = RankedResults {
            round: 1,
            query: "q".to_string(),
            items: vec![make("a"), make("b"), make("web")],
            ranked_len: 2,
        };
        assert_eq!(results.ranked().len(), 2);
        assert_eq!(results.fallbacks().len(), 1);
        assert_eq!(results.fallbacks()[0].candidate.id, "web");
    }
}
