//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default ranking settings
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_MIN_MATCH_SCORE: f64 = 0.3;
pub const DEFAULT_MATCH_WEIGHT: f64 = 0.8;
pub const DEFAULT_USAGE_SATURATION: f64 = 50.0;

/// Default usage tracking settings
pub const DEFAULT_TRACK_USAGE: bool = true;
pub const DEFAULT_USAGE_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_RECENCY_WINDOW_DAYS: f64 = 30.0;
pub const DEFAULT_RECENCY_FLOOR: f64 = 0.5;

/// Identifiers never recorded in usage history by default.
/// Quitting the launcher is not a meaningful preference signal.
pub const DEFAULT_USAGE_EXCLUDED_IDENTIFIERS: &[&str] = &["builtin-quit"];

/// Default dispatch settings
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 150;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
pub const DEFAULT_CACHE_TTL_MS: u64 = 5000;

/// Default provider toggles
pub const DEFAULT_APPLICATIONS: bool = true;
pub const DEFAULT_SYSTEM_COMMANDS: bool = true;
pub const DEFAULT_SYSTEM_SETTINGS: bool = true;
pub const DEFAULT_WINDOW_PLACEMENT: bool = true;
pub const DEFAULT_BOOKMARKS: bool = true;
pub const DEFAULT_CALCULATOR: bool = true;
pub const DEFAULT_WEB_SEARCH: bool = true;

/// Default web search engines as (id, name, url template)
pub const DEFAULT_SEARCH_ENGINES: &[(&str, &str, &str)] = &[
    (
        "google",
        "Google",
        "https://www.google.com/search?q={query}",
    ),
    (
        "duckduckgo",
        "DuckDuckGo",
        "https://duckduckgo.com/?q={query}",
    ),
];

/// Directories scanned for installed applications
#[cfg(target_os = "macos")]
pub const DEFAULT_APPLICATION_DIRECTORIES: &[&str] = &[
    "/Applications",
    "/System/Applications",
    "/System/Applications/Utilities",
    "/Applications/Utilities",
    "~/Applications",
];

#[cfg(not(target_os = "macos"))]
pub const DEFAULT_APPLICATION_DIRECTORIES: &[&str] = &[
    "/usr/share/applications",
    "/usr/local/share/applications",
    "/var/lib/flatpak/exports/share/applications",
    "~/.local/share/applications",
];
