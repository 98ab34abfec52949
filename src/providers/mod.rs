//! Result providers
//!
//! Each provider turns a query into scored candidates. Providers never see
//! each other's output and only read the per-round [`QueryContext`], so the
//! dispatcher can run them concurrently.
//!
//! - `apps` - installed programs (catalog scan + running indicator)
//! - `builtins` - launcher commands (preferences, clear history, quit)
//! - `system_settings` - operating system settings panes
//! - `window_placement` - halves, quarters, maximize
//! - `bookmarks` - user bookmarks and standard folders
//! - `calculator` - arithmetic expressions
//! - `web_search` - fallback search links appended after ranking

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::candidate::{Candidate, CandidateAction, CandidateKind, Query, ScoredCandidate};
use crate::config::Config;
use crate::fuzzy::{match_best, match_score};
use crate::scoring::ScoreWeights;

pub mod apps;
pub mod bookmarks;
pub mod builtins;
pub mod calculator;
pub mod system_settings;
pub mod web_search;
pub mod window_placement;

pub use apps::{AppCatalog, AppInfo, AppsProvider};
pub use bookmarks::BookmarksProvider;
pub use builtins::BuiltinsProvider;
pub use calculator::CalculatorProvider;
pub use system_settings::SystemSettingsProvider;
pub use web_search::WebSearchProvider;
pub use window_placement::WindowPlacementProvider;

/// Where a provider's output lands in the published list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Competes for the top-N slots
    Ranked,
    /// Appended after truncation, in provider order
    Tail,
}

/// Read-only snapshot shared by every provider in one round
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub usage_scores: HashMap<String, f64>,
    pub running_identifiers: HashSet<String>,
    pub weights: ScoreWeights,
}

impl QueryContext {
    pub fn usage_score(&self, identifier: &str) -> f64 {
        self.usage_scores.get(identifier).copied().unwrap_or(0.0)
    }

    pub fn is_running(&self, identifier: &str) -> bool {
        self.running_identifiers.contains(identifier)
    }

    /// Blend the candidate's match score with its usage, or drop it
    pub fn combine(&self, candidate: Candidate) -> Option<ScoredCandidate> {
        let usage = self.usage_score(&candidate.id);
        self.weights
            .combine(candidate.match_score, usage)
            .map(|score| ScoredCandidate::new(candidate, score))
    }
}

/// A source of candidates.
///
/// `provide` may be called concurrently with other providers and with
/// itself from overlapping rounds; implementations hold no per-call state.
pub trait ResultProvider: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &'static str;

    fn placement(&self) -> Placement {
        Placement::Ranked
    }

    fn provide(&self, query: &Query, context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>>;
}

/// A fixed command with alias keywords, shared by the static providers
#[derive(Debug, Clone)]
pub struct StaticEntry {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub keywords: Vec<String>,
    pub kind: CandidateKind,
    pub action: CandidateAction,
    title_lower: String,
    subtitle_lower: String,
}

impl StaticEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        keywords: &[&str],
        kind: CandidateKind,
        action: CandidateAction,
    ) -> Self {
        let title = title.into();
        let subtitle = subtitle.into();
        StaticEntry {
            id: id.into(),
            title_lower: title.to_lowercase(),
            subtitle_lower: subtitle.to_lowercase(),
            title,
            subtitle,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            kind,
            action,
        }
    }

    /// Best of the title, the description and the alias list
    pub fn match_score(&self, query: &str) -> f64 {
        match_score(query, &self.title_lower)
            .max(match_score(query, &self.subtitle_lower))
            .max(match_best(query, &self.keywords))
    }

    fn to_candidate(&self, match_score: f64) -> Candidate {
        Candidate::new(
            self.id.clone(),
            self.title.clone(),
            self.subtitle.clone(),
            self.kind,
            self.action.clone(),
        )
        .with_match_score(match_score)
    }
}

/// Score a fixed entry list against the query
pub fn score_static_entries(
    entries: &[StaticEntry],
    query: &Query,
    context: &QueryContext,
) -> Vec<ScoredCandidate> {
    if query.is_blank() {
        return Vec::new();
    }
    entries
        .iter()
        .filter_map(|entry| {
            let score = entry.match_score(query.lower());
            context.combine(entry.to_candidate(score))
        })
        .collect()
}

/// Providers enabled by `config`, in registration order
pub fn default_providers(config: &Config, catalog: Arc<AppCatalog>) -> Vec<Arc<dyn ResultProvider>> {
    let builtins = config.get_builtins();
    let mut providers: Vec<Arc<dyn ResultProvider>> = Vec::new();

    if builtins.applications {
        providers.push(Arc::new(AppsProvider::new(catalog)));
    }
    if builtins.system_commands {
        providers.push(Arc::new(BuiltinsProvider::new()));
    }
    if builtins.system_settings {
        providers.push(Arc::new(SystemSettingsProvider::new()));
    }
    if builtins.window_placement {
        providers.push(Arc::new(WindowPlacementProvider::new()));
    }
    if builtins.bookmarks {
        providers.push(Arc::new(BookmarksProvider::from_config(&config.bookmarks)));
    }
    if builtins.calculator {
        providers.push(Arc::new(CalculatorProvider::new()));
    }
    if builtins.web_search {
        providers.push(Arc::new(WebSearchProvider::new(config.get_web_search().engines)));
    }

    tracing::debug!(provider_count = providers.len(), "Registered result providers");
    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::InternalCommand;
    use crate::config::BuiltInConfig;

    fn quit_entry() -> StaticEntry {
        StaticEntry::new(
            "builtin-quit",
            "Quit Launcher",
            "Close the launcher completely",
            &["quit", "exit", "terminate"],
            CandidateKind::Command,
            CandidateAction::Internal {
                command: InternalCommand::Quit,
            },
        )
    }

    #[test]
    fn test_static_entry_scores_aliases() {
        let entry = quit_entry();
        assert_eq!(entry.match_score("exit"), 1.0);
        assert_eq!(entry.match_score("termin"), 0.9);
        assert_eq!(entry.match_score("quit launcher"), 1.0);
    }

    #[test]
    fn test_static_entry_scores_description() {
        let entry = quit_entry();
        // "close" only appears in the description
        assert_eq!(entry.match_score("close"), 0.9);
    }

    #[test]
    fn test_score_static_entries_applies_threshold() {
        let entries = vec![quit_entry()];
        let context = QueryContext::default();
        assert_eq!(score_static_entries(&entries, &Query::new("exit"), &context).len(), 1);
        assert!(score_static_entries(&entries, &Query::new("zzz"), &context).is_empty());
        assert!(score_static_entries(&entries, &Query::new(""), &context).is_empty());
    }

    #[test]
    fn test_context_blends_usage() {
        let mut context = QueryContext::default();
        context.usage_scores.insert("builtin-quit".to_string(), 1000.0);
        let scored = score_static_entries(&[quit_entry()], &Query::new("exit"), &context);
        assert_eq!(scored[0].score, 1.0);
        assert_eq!(scored[0].candidate.match_score, 1.0);
    }

    #[test]
    fn test_default_providers_follow_toggles() {
        let catalog = Arc::new(AppCatalog::with_apps(Vec::new()));
        let all = default_providers(&Config::default(), catalog.clone());
        let names: Vec<_> = all.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "applications",
                "system-commands",
                "system-settings",
                "window-placement",
                "bookmarks",
                "calculator",
                "web-search"
            ]
        );

        let config = Config {
            built_ins: Some(BuiltInConfig {
                web_search: false,
                applications: false,
                ..BuiltInConfig::default()
            }),
            ..Config::default()
        };
        let some = default_providers(&config, catalog);
        assert_eq!(some.len(), 5);
        assert!(some.iter().all(|p| p.name() != "web-search"));
    }
}
