//! Installed application catalog and search
//!
//! The catalog scans application directories for `.app` bundles (macOS)
//! and `.desktop` entries (freedesktop). Scans replace the whole snapshot,
//! so readers always see a complete list.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{QueryContext, ResultProvider};
use crate::candidate::{Candidate, CandidateAction, CandidateKind, Query, ScoredCandidate};
use crate::error::ResultExt;
use crate::fuzzy::{match_best, word_terms};

/// Information about an installed application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Stable identifier: bundle id, desktop file id, or the path
    pub id: String,
    pub name: String,
    /// Path to the .app bundle or .desktop file
    pub path: PathBuf,
    /// Executable name used to spot running instances
    pub executable: Option<String>,
    /// Lower-cased name and its word-boundary suffixes
    terms: Vec<String>,
}

impl AppInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        AppInfo {
            id: id.into(),
            terms: word_terms(&name),
            name,
            path: path.into(),
            executable: None,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Shared snapshot of installed applications
#[derive(Debug)]
pub struct AppCatalog {
    directories: Vec<PathBuf>,
    apps: RwLock<Arc<Vec<AppInfo>>>,
}

impl AppCatalog {
    /// Empty catalog over `directories`; call [`AppCatalog::refresh`] to scan
    pub fn new(directories: Vec<PathBuf>) -> Self {
        AppCatalog {
            directories,
            apps: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Catalog with a fixed list and no directories
    pub fn with_apps(apps: Vec<AppInfo>) -> Self {
        AppCatalog {
            directories: Vec::new(),
            apps: RwLock::new(Arc::new(apps)),
        }
    }

    /// Current list, cheap to clone and safe to hold across a scan
    pub fn snapshot(&self) -> Arc<Vec<AppInfo>> {
        self.apps.read().clone()
    }

    pub fn len(&self) -> usize {
        self.apps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.read().is_empty()
    }

    pub fn find(&self, id: &str) -> Option<AppInfo> {
        self.apps.read().iter().find(|app| app.id == id).cloned()
    }

    /// Rescan all directories and swap in the result. Returns the app count.
    pub fn refresh(&self) -> usize {
        if self.directories.is_empty() {
            return self.len();
        }
        let start = Instant::now();
        let apps = scan_directories(&self.directories);
        let count = apps.len();
        *self.apps.write() = Arc::new(apps);
        info!(
            app_count = count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Scanned applications"
        );
        count
    }

    /// Replace the list (used by embedders with their own catalog source)
    pub fn replace(&self, apps: Vec<AppInfo>) {
        *self.apps.write() = Arc::new(apps);
    }
}

/// Scan every directory, sorted by name with duplicate names removed
fn scan_directories(directories: &[PathBuf]) -> Vec<AppInfo> {
    let mut apps = Vec::new();

    for dir in directories {
        if !dir.exists() {
            debug!(directory = %dir.display(), "Directory does not exist, skipping");
            continue;
        }
        match scan_directory(dir) {
            Ok(found) => {
                debug!(directory = %dir.display(), count = found.len(), "Scanned directory");
                apps.extend(found);
            }
            Err(e) => {
                warn!(directory = %dir.display(), error = %e, "Failed to scan directory");
            }
        }
    }

    // Stable sort keeps the first directory's entry for duplicate names
    apps.sort_by_key(|app| app.name.to_lowercase());
    apps.dedup_by(|a, b| a.name.to_lowercase() == b.name.to_lowercase());
    apps
}

fn scan_directory(dir: &Path) -> Result<Vec<AppInfo>> {
    let mut apps = Vec::new();

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("app") => parse_app_bundle(&path),
            Some("desktop") => parse_desktop_entry(&path),
            _ => None,
        };
        if let Some(app) = parsed {
            apps.push(app);
        }
    }

    Ok(apps)
}

/// Parse a .app bundle (name from the bundle, id from Info.plist)
fn parse_app_bundle(path: &Path) -> Option<AppInfo> {
    let name = path.file_stem()?.to_str()?.to_string();
    let id = extract_bundle_id(path).unwrap_or_else(|| path.display().to_string());
    Some(AppInfo::new(id, name.clone(), path).with_executable(name))
}

/// Read CFBundleIdentifier with PlistBuddy
fn extract_bundle_id(app_path: &Path) -> Option<String> {
    let plist_path = app_path.join("Contents/Info.plist");
    if !plist_path.exists() {
        return None;
    }

    let output = Command::new("/usr/libexec/PlistBuddy")
        .args(["-c", "Print :CFBundleIdentifier", plist_path.to_str()?])
        .output()
        .ok()?;

    if output.status.success() {
        let bundle_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !bundle_id.is_empty() {
            return Some(bundle_id);
        }
    }
    None
}

fn parse_desktop_entry(path: &Path) -> Option<AppInfo> {
    let content = fs::read_to_string(path).warn_on_err()?;
    let file_id = path.file_name()?.to_str()?.to_string();
    parse_desktop_content(&file_id, path, &content)
}

/// Parse the `[Desktop Entry]` group of a .desktop file.
///
/// Hidden and `NoDisplay` entries and non-application types are skipped.
fn parse_desktop_content(file_id: &str, path: &Path, content: &str) -> Option<AppInfo> {
    let mut in_entry = false;
    let mut name = None;
    let mut exec = None;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match (key.trim(), value.trim()) {
            ("Name", v) => name = Some(v.to_string()),
            ("Exec", v) => exec = Some(v.to_string()),
            ("NoDisplay" | "Hidden", "true") => return None,
            ("Type", v) if v != "Application" => return None,
            _ => {}
        }
    }

    let name = name.filter(|n| !n.is_empty())?;
    let mut app = AppInfo::new(file_id, name, path);
    if let Some(executable) = exec.as_deref().and_then(exec_name) {
        app = app.with_executable(executable);
    }
    Some(app)
}

/// Program name from an Exec line: first token, basename, field codes ignored
fn exec_name(exec: &str) -> Option<String> {
    let program = exec.split_whitespace().find(|token| !token.starts_with('%'))?;
    let program = program.trim_matches('"');
    let base = Path::new(program).file_name()?.to_str()?;
    (!base.is_empty()).then(|| base.to_string())
}

/// Matches installed programs by display name
pub struct AppsProvider {
    catalog: Arc<AppCatalog>,
}

impl AppsProvider {
    pub fn new(catalog: Arc<AppCatalog>) -> Self {
        AppsProvider { catalog }
    }
}

impl ResultProvider for AppsProvider {
    fn name(&self) -> &'static str {
        "applications"
    }

    fn provide(&self, query: &Query, context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        if query.is_blank() {
            return Ok(Vec::new());
        }
        let apps = self.catalog.snapshot();
        let results = apps
            .iter()
            .filter_map(|app| {
                let score = match_best(query.lower(), app.terms());
                let candidate = Candidate::new(
                    app.id.clone(),
                    app.name.clone(),
                    app.path.display().to_string(),
                    CandidateKind::Program,
                    CandidateAction::LaunchApp {
                        path: app.path.clone(),
                    },
                )
                .with_match_score(score)
                .with_running(context.is_running(&app.id));
                context.combine(candidate)
            })
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<AppCatalog> {
        Arc::new(AppCatalog::with_apps(vec![
            AppInfo::new(
                "com.google.Chrome",
                "Google Chrome",
                "/Applications/Google Chrome.app",
            ),
            AppInfo::new("com.apple.Safari", "Safari", "/Applications/Safari.app"),
            AppInfo::new(
                "com.apple.Terminal",
                "Terminal",
                "/System/Applications/Utilities/Terminal.app",
            ),
        ]))
    }

    #[test]
    fn test_word_prefix_scores_as_prefix() {
        let provider = AppsProvider::new(catalog());
        let results = provider
            .provide(&Query::new("chrom"), &QueryContext::default())
            .unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.candidate.id, "com.google.Chrome");
        assert_eq!(result.candidate.kind, CandidateKind::Program);
        assert_eq!(result.candidate.match_score, 0.9);
        assert!((result.score - 0.72).abs() < 1e-12);
    }

    #[test]
    fn test_running_indicator() {
        let provider = AppsProvider::new(catalog());
        let mut context = QueryContext::default();
        context
            .running_identifiers
            .insert("com.apple.Safari".to_string());

        let results = provider.provide(&Query::new("saf"), &context).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].candidate.running);

        let results = provider.provide(&Query::new("term"), &context).unwrap();
        assert!(!results[0].candidate.running);
    }

    #[test]
    fn test_blank_and_unmatched_queries() {
        let provider = AppsProvider::new(catalog());
        let context = QueryContext::default();
        assert!(provider.provide(&Query::new(" "), &context).unwrap().is_empty());
        assert!(provider.provide(&Query::new("qzzzzz"), &context).unwrap().is_empty());
    }

    #[test]
    fn test_parse_desktop_content() {
        let content = "\
[Desktop Entry]
Type=Application
Name=Firefox Web Browser
Exec=/usr/lib/firefox/firefox %u
Icon=firefox

[Desktop Action new-window]
Name=New Window
";
        let app = parse_desktop_content(
            "firefox.desktop",
            Path::new("/usr/share/applications/firefox.desktop"),
            content,
        )
        .unwrap();
        assert_eq!(app.id, "firefox.desktop");
        assert_eq!(app.name, "Firefox Web Browser");
        assert_eq!(app.executable.as_deref(), Some("firefox"));
        assert!(app.terms().contains(&"web browser".to_string()));
    }

    #[test]
    fn test_parse_desktop_content_skips_hidden() {
        let content = "[Desktop Entry]\nType=Application\nName=Helper\nNoDisplay=true\n";
        assert!(parse_desktop_content("h.desktop", Path::new("h.desktop"), content).is_none());

        let link = "[Desktop Entry]\nType=Link\nName=Docs\nURL=https://example.com\n";
        assert!(parse_desktop_content("d.desktop", Path::new("d.desktop"), link).is_none());
    }

    #[test]
    fn test_exec_name() {
        assert_eq!(exec_name("code --new-window %F").as_deref(), Some("code"));
        assert_eq!(exec_name("/usr/bin/gimp-2.10 %U").as_deref(), Some("gimp-2.10"));
        assert_eq!(exec_name("%U"), None);
    }

    #[test]
    fn test_refresh_scans_desktop_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("editor.desktop"),
            "[Desktop Entry]\nType=Application\nName=Text Editor\nExec=gedit %U\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("hidden.desktop"),
            "[Desktop Entry]\nType=Application\nName=Hidden\nNoDisplay=true\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = AppCatalog::new(vec![dir.path().to_path_buf()]);
        assert!(catalog.is_empty());
        assert_eq!(catalog.refresh(), 1);
        let app = catalog.find("editor.desktop").unwrap();
        assert_eq!(app.name, "Text Editor");
        assert_eq!(app.executable.as_deref(), Some("gedit"));
    }

    #[test]
    fn test_refresh_dedups_names_across_directories() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for dir in [&first, &second] {
            fs::write(
                dir.path().join("term.desktop"),
                "[Desktop Entry]\nName=Terminal\nExec=term\n",
            )
            .unwrap();
        }
        let catalog = AppCatalog::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
            PathBuf::from("/nonexistent/apps"),
        ]);
        assert_eq!(catalog.refresh(), 1);
        assert!(catalog.snapshot()[0].path.starts_with(first.path()));
    }
}
