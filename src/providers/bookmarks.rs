//! Bookmarks and folder shortcuts
//!
//! User bookmarks come from config; the standard user folders are always
//! available. A target that parses as a URL opens as one, anything else is
//! treated as a (tilde-expanded) path.

use std::path::PathBuf;

use url::Url;

use super::{score_static_entries, QueryContext, ResultProvider, StaticEntry};
use crate::candidate::{CandidateAction, CandidateKind, Query, ScoredCandidate};
use crate::config::BookmarkConfig;

pub struct BookmarksProvider {
    entries: Vec<StaticEntry>,
}

impl BookmarksProvider {
    pub fn new(entries: Vec<StaticEntry>) -> Self {
        BookmarksProvider { entries }
    }

    /// User bookmarks followed by the standard folders
    pub fn from_config(bookmarks: &[BookmarkConfig]) -> Self {
        let mut entries: Vec<StaticEntry> = bookmarks.iter().map(bookmark_entry).collect();
        entries.extend(default_folder_entries());
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResultProvider for BookmarksProvider {
    fn name(&self) -> &'static str {
        "bookmarks"
    }

    fn provide(&self, query: &Query, context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        Ok(score_static_entries(&self.entries, query, context))
    }
}

/// URL action for web-like targets, path action otherwise
fn target_action(target: &str) -> CandidateAction {
    match Url::parse(target) {
        // Single-letter schemes are Windows drive letters, not URLs
        Ok(url) if url.scheme().len() > 1 => CandidateAction::OpenUrl {
            url: url.to_string(),
        },
        _ => CandidateAction::OpenPath {
            path: PathBuf::from(shellexpand::tilde(target).as_ref()),
        },
    }
}

fn bookmark_entry(bookmark: &BookmarkConfig) -> StaticEntry {
    let keywords: Vec<&str> = bookmark.keywords.iter().map(String::as_str).collect();
    StaticEntry::new(
        format!("bookmark:{}", bookmark.target),
        bookmark.name.clone(),
        bookmark.target.clone(),
        &keywords,
        CandidateKind::Shortcut,
        target_action(&bookmark.target),
    )
}

fn default_folder_entries() -> Vec<StaticEntry> {
    let folders: [(&str, Option<PathBuf>, &[&str]); 4] = [
        ("Home", dirs::home_dir(), &["home", "user folder"]),
        ("Desktop", dirs::desktop_dir(), &["desktop"]),
        ("Documents", dirs::document_dir(), &["documents", "docs"]),
        ("Downloads", dirs::download_dir(), &["downloads"]),
    ];

    folders
        .into_iter()
        .filter_map(|(name, path, keywords)| {
            let path = path?;
            Some(StaticEntry::new(
                format!("folder:{}", name.to_lowercase()),
                name,
                path.display().to_string(),
                keywords,
                CandidateKind::Shortcut,
                CandidateAction::OpenPath { path },
            ))
        })
        .collect()
}
