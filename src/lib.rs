//! quicklaunch-core - query-time ranking core for a desktop launcher
//!
//! Every keystroke becomes one aggregation round: providers are queried
//! concurrently, their fuzzy match scores are blended with usage history,
//! and the top results are published unless a newer round has started.

pub mod actions;
pub mod calculator;
pub mod candidate;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fuzzy;
pub mod logging;
pub mod providers;
pub mod running;
pub mod scoring;
pub mod usage;

pub use actions::{activate, ActionExecutor, ActionOutcome, SystemActionExecutor};
pub use candidate::{Candidate, CandidateAction, CandidateKind, Query, RankedResults, ScoredCandidate};
pub use config::Config;
pub use dispatcher::{DispatchOptions, QueryDispatcher};
pub use error::{LauncherError, Result};
pub use providers::{AppCatalog, QueryContext, ResultProvider};
pub use running::{ProcessRunningApps, RunningAppsSource};
pub use usage::UsageTracker;
