//! Configuration type definitions
//!
//! This module contains all the struct and enum definitions for configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use super::defaults::*;

// ============================================
// RANKING CONFIG
// ============================================

/// How candidates are scored and cut off
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingConfig {
    /// Maximum ranked results before fallback entries (default: 10)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Match scores at or below this are dropped (default: 0.3)
    #[serde(default = "default_min_match_score")]
    pub min_match_score: f64,
    /// Share of the final score taken by text relevance (default: 0.8)
    #[serde(default = "default_match_weight")]
    pub match_weight: f64,
    /// Usage score treated as "fully familiar" (default: 50.0)
    #[serde(default = "default_usage_saturation")]
    pub usage_saturation: f64,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_min_match_score() -> f64 {
    DEFAULT_MIN_MATCH_SCORE
}
fn default_match_weight() -> f64 {
    DEFAULT_MATCH_WEIGHT
}
fn default_usage_saturation() -> f64 {
    DEFAULT_USAGE_SATURATION
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            max_results: DEFAULT_MAX_RESULTS,
            min_match_score: DEFAULT_MIN_MATCH_SCORE,
            match_weight: DEFAULT_MATCH_WEIGHT,
            usage_saturation: DEFAULT_USAGE_SATURATION,
        }
    }
}

// ============================================
// USAGE CONFIG
// ============================================

/// Usage history tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageConfig {
    /// Whether selections are recorded (default: true)
    /// If false, no new usage is recorded but existing data still scores
    #[serde(default = "default_track_usage")]
    pub track_usage: bool,
    /// Quiet period before a burst of selections is written (default: 1000)
    #[serde(default = "default_usage_debounce_ms")]
    pub debounce_ms: u64,
    /// Days over which recency decays to the floor (default: 30)
    #[serde(default = "default_recency_window_days")]
    pub recency_window_days: f64,
    /// Lowest recency multiplier (default: 0.5)
    #[serde(default = "default_recency_floor")]
    pub recency_floor: f64,
    /// Identifiers that are never recorded
    #[serde(default = "default_excluded_identifiers")]
    pub excluded_identifiers: Vec<String>,
    /// Override for the usage file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_track_usage() -> bool {
    DEFAULT_TRACK_USAGE
}
fn default_usage_debounce_ms() -> u64 {
    DEFAULT_USAGE_DEBOUNCE_MS
}
fn default_recency_window_days() -> f64 {
    DEFAULT_RECENCY_WINDOW_DAYS
}
fn default_recency_floor() -> f64 {
    DEFAULT_RECENCY_FLOOR
}
fn default_excluded_identifiers() -> Vec<String> {
    DEFAULT_USAGE_EXCLUDED_IDENTIFIERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UsageConfig {
    fn default() -> Self {
        UsageConfig {
            track_usage: DEFAULT_TRACK_USAGE,
            debounce_ms: DEFAULT_USAGE_DEBOUNCE_MS,
            recency_window_days: DEFAULT_RECENCY_WINDOW_DAYS,
            recency_floor: DEFAULT_RECENCY_FLOOR,
            excluded_identifiers: default_excluded_identifiers(),
            path: None,
        }
    }
}

impl UsageConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Resolved usage file path (`path` override or the per-user data dir)
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => default_usage_path(),
        }
    }
}

/// `<data dir>/quicklaunch/usage.json`
pub fn default_usage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("quicklaunch")
        .join("usage.json")
}

// ============================================
// DISPATCH CONFIG
// ============================================

/// Per-keystroke aggregation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// Providers that miss this deadline are dropped for the round (default: 150)
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    /// Number of cached query results (default: 64, 0 disables the cache)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Maximum age of a cached result (default: 5000)
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
}

fn default_provider_timeout_ms() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_MS
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}
fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

impl DispatchConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

// ============================================
// BUILT-IN PROVIDER CONFIG
// ============================================

/// Which result providers take part in a search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltInConfig {
    #[serde(default = "default_applications")]
    pub applications: bool,
    #[serde(default = "default_system_commands")]
    pub system_commands: bool,
    #[serde(default = "default_system_settings")]
    pub system_settings: bool,
    #[serde(default = "default_window_placement")]
    pub window_placement: bool,
    #[serde(default = "default_bookmarks")]
    pub bookmarks: bool,
    #[serde(default = "default_calculator")]
    pub calculator: bool,
    #[serde(default = "default_web_search")]
    pub web_search: bool,
}

fn default_applications() -> bool {
    DEFAULT_APPLICATIONS
}
fn default_system_commands() -> bool {
    DEFAULT_SYSTEM_COMMANDS
}
fn default_system_settings() -> bool {
    DEFAULT_SYSTEM_SETTINGS
}
fn default_window_placement() -> bool {
    DEFAULT_WINDOW_PLACEMENT
}
fn default_bookmarks() -> bool {
    DEFAULT_BOOKMARKS
}
fn default_calculator() -> bool {
    DEFAULT_CALCULATOR
}
fn default_web_search() -> bool {
    DEFAULT_WEB_SEARCH
}

impl Default for BuiltInConfig {
    fn default() -> Self {
        BuiltInConfig {
            applications: DEFAULT_APPLICATIONS,
            system_commands: DEFAULT_SYSTEM_COMMANDS,
            system_settings: DEFAULT_SYSTEM_SETTINGS,
            window_placement: DEFAULT_WINDOW_PLACEMENT,
            bookmarks: DEFAULT_BOOKMARKS,
            calculator: DEFAULT_CALCULATOR,
            web_search: DEFAULT_WEB_SEARCH,
        }
    }
}

// ============================================
// WEB SEARCH CONFIG
// ============================================

/// A fallback search engine; `{query}` in the template is replaced by the encoded query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEngine {
    pub id: String,
    pub name: String,
    pub url_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchConfig {
    #[serde(default = "default_search_engines")]
    pub engines: Vec<SearchEngine>,
}

fn default_search_engines() -> Vec<SearchEngine> {
    DEFAULT_SEARCH_ENGINES
        .iter()
        .map(|(id, name, template)| SearchEngine {
            id: id.to_string(),
            name: name.to_string(),
            url_template: template.to_string(),
        })
        .collect()
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        WebSearchConfig {
            engines: default_search_engines(),
        }
    }
}

// ============================================
// BOOKMARK CONFIG
// ============================================

/// A user bookmark: a URL or a (tilde-expandable) path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkConfig {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ============================================
// MAIN CONFIG
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RankingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_ins: Option<BuiltInConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search: Option<WebSearchConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bookmarks: Vec<BookmarkConfig>,
    /// Directories scanned for installed applications (platform defaults when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_directories: Option<Vec<String>>,
}

impl Config {
    pub fn get_ranking(&self) -> RankingConfig {
        self.ranking.clone().unwrap_or_default()
    }

    pub fn get_usage(&self) -> UsageConfig {
        self.usage.clone().unwrap_or_default()
    }

    pub fn get_dispatch(&self) -> DispatchConfig {
        self.dispatch.clone().unwrap_or_default()
    }

    pub fn get_builtins(&self) -> BuiltInConfig {
        self.built_ins.clone().unwrap_or_default()
    }

    pub fn get_web_search(&self) -> WebSearchConfig {
        self.web_search.clone().unwrap_or_default()
    }

    /// Application directories with `~` expanded
    pub fn get_application_directories(&self) -> Vec<PathBuf> {
        match &self.application_directories {
            Some(dirs) => dirs
                .iter()
                .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
                .collect(),
            None => DEFAULT_APPLICATION_DIRECTORIES
                .iter()
                .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
                .collect(),
        }
    }

    /// Replace out-of-range values with their defaults.
    ///
    /// Returns the number of fields that were reset.
    pub fn validate(&mut self) -> usize {
        let mut fixed = 0;

        if let Some(ranking) = self.ranking.as_mut() {
            if ranking.max_results == 0 {
                warn!("ranking.maxResults must be positive, using default");
                ranking.max_results = DEFAULT_MAX_RESULTS;
                fixed += 1;
            }
            if !(0.0..1.0).contains(&ranking.min_match_score) {
                warn!(
                    value = ranking.min_match_score,
                    "ranking.minMatchScore out of range, using default"
                );
                ranking.min_match_score = DEFAULT_MIN_MATCH_SCORE;
                fixed += 1;
            }
            if !(0.0..=1.0).contains(&ranking.match_weight) {
                warn!(
                    value = ranking.match_weight,
                    "ranking.matchWeight out of range, using default"
                );
                ranking.match_weight = DEFAULT_MATCH_WEIGHT;
                fixed += 1;
            }
            if !(ranking.usage_saturation > 0.0) {
                warn!("ranking.usageSaturation must be positive, using default");
                ranking.usage_saturation = DEFAULT_USAGE_SATURATION;
                fixed += 1;
            }
        }

        if let Some(usage) = self.usage.as_mut() {
            if !(usage.recency_window_days > 0.0) {
                warn!("usage.recencyWindowDays must be positive, using default");
                usage.recency_window_days = DEFAULT_RECENCY_WINDOW_DAYS;
                fixed += 1;
            }
            if !(0.0..=1.0).contains(&usage.recency_floor) {
                warn!("usage.recencyFloor out of range, using default");
                usage.recency_floor = DEFAULT_RECENCY_FLOOR;
                fixed += 1;
            }
        }

        fixed
    }
}
