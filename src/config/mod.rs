//! Configuration module - Ranking, usage and provider settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.quicklaunch/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, RankingConfig, etc.)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_APPLICATION_DIRECTORIES, DEFAULT_MAX_RESULTS, DEFAULT_RECENCY_FLOOR,
    DEFAULT_RECENCY_WINDOW_DAYS, DEFAULT_USAGE_DEBOUNCE_MS,
};

pub use types::{
    default_usage_path, BookmarkConfig, BuiltInConfig, Config, DispatchConfig, RankingConfig,
    SearchEngine, UsageConfig, WebSearchConfig,
};

pub use loader::{default_config_path, load_config, load_config_from};

#[cfg(test)]
pub use defaults::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_MATCH_WEIGHT, DEFAULT_MIN_MATCH_SCORE,
    DEFAULT_PROVIDER_TIMEOUT_MS, DEFAULT_USAGE_EXCLUDED_IDENTIFIERS,
};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
