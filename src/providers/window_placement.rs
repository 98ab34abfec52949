//! Window placement commands
//!
//! Only the command surface lives here; moving the frontmost window is the
//! platform layer's job.

use serde::{Deserialize, Serialize};

use super::{score_static_entries, QueryContext, ResultProvider, StaticEntry};
use crate::candidate::{CandidateAction, CandidateKind, Query, ScoredCandidate};

/// Tiling positions for the frontmost window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TilePosition {
    LeftHalf,
    RightHalf,
    TopHalf,
    BottomHalf,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Fill the visible screen area
    Maximize,
    /// Keep the size, move to the middle
    Center,
}

impl TilePosition {
    pub const ALL: [TilePosition; 10] = [
        TilePosition::LeftHalf,
        TilePosition::RightHalf,
        TilePosition::TopHalf,
        TilePosition::BottomHalf,
        TilePosition::TopLeft,
        TilePosition::TopRight,
        TilePosition::BottomLeft,
        TilePosition::BottomRight,
        TilePosition::Maximize,
        TilePosition::Center,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TilePosition::LeftHalf => "window-left-half",
            TilePosition::RightHalf => "window-right-half",
            TilePosition::TopHalf => "window-top-half",
            TilePosition::BottomHalf => "window-bottom-half",
            TilePosition::TopLeft => "window-top-left",
            TilePosition::TopRight => "window-top-right",
            TilePosition::BottomLeft => "window-bottom-left",
            TilePosition::BottomRight => "window-bottom-right",
            TilePosition::Maximize => "window-maximize",
            TilePosition::Center => "window-center",
        }
    }

    fn entry(self) -> StaticEntry {
        let (title, subtitle, keywords): (&str, &str, &[&str]) = match self {
            TilePosition::LeftHalf => (
                "Left Half",
                "Move window to the left half of the screen",
                &["left", "tile left", "snap left", "half"],
            ),
            TilePosition::RightHalf => (
                "Right Half",
                "Move window to the right half of the screen",
                &["right", "tile right", "snap right", "half"],
            ),
            TilePosition::TopHalf => (
                "Top Half",
                "Move window to the top half of the screen",
                &["top", "upper", "half"],
            ),
            TilePosition::BottomHalf => (
                "Bottom Half",
                "Move window to the bottom half of the screen",
                &["bottom", "lower", "half"],
            ),
            TilePosition::TopLeft => (
                "Top Left Quarter",
                "Move window to the top-left quarter",
                &["top left", "quarter", "corner"],
            ),
            TilePosition::TopRight => (
                "Top Right Quarter",
                "Move window to the top-right quarter",
                &["top right", "quarter", "corner"],
            ),
            TilePosition::BottomLeft => (
                "Bottom Left Quarter",
                "Move window to the bottom-left quarter",
                &["bottom left", "quarter", "corner"],
            ),
            TilePosition::BottomRight => (
                "Bottom Right Quarter",
                "Move window to the bottom-right quarter",
                &["bottom right", "quarter", "corner"],
            ),
            TilePosition::Maximize => (
                "Maximize Window",
                "Fill the screen with the window",
                &["maximize", "fullscreen", "full screen", "fill", "zoom"],
            ),
            TilePosition::Center => (
                "Center Window",
                "Move window to the center of the screen",
                &["center", "centre", "middle"],
            ),
        };
        StaticEntry::new(
            self.id(),
            title,
            subtitle,
            keywords,
            CandidateKind::WindowPlacement,
            CandidateAction::PlaceWindow { position: self },
        )
    }
}

pub struct WindowPlacementProvider {
    entries: Vec<StaticEntry>,
}

impl WindowPlacementProvider {
    pub fn new() -> Self {
        WindowPlacementProvider {
            entries: TilePosition::ALL.iter().map(|p| p.entry()).collect(),
        }
    }
}

impl Default for WindowPlacementProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultProvider for WindowPlacementProvider {
    fn name(&self) -> &'static str {
        "window-placement"
    }

    fn provide(&self, query: &Query, context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        Ok(score_static_entries(&self.entries, query, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = TilePosition::ALL.iter().map(|p| p.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), TilePosition::ALL.len());
    }

    #[test]
    fn test_alias_finds_maximize() {
        let provider = WindowPlacementProvider::new();
        let results = provider
            .provide(&Query::new("fullscreen"), &QueryContext::default())
            .unwrap();
        let best = results
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(best.candidate.id, "window-maximize");
        assert_eq!(best.candidate.match_score, 1.0);
        assert_eq!(
            best.candidate.action,
            CandidateAction::PlaceWindow {
                position: TilePosition::Maximize
            }
        );
    }

    #[test]
    fn test_left_matches_left_entries() {
        let provider = WindowPlacementProvider::new();
        let results = provider
            .provide(&Query::new("left"), &QueryContext::default())
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.candidate.id.as_str()).collect();
        assert!(ids.contains(&"window-left-half"));
        assert!(ids.contains(&"window-top-left"));
        assert!(!ids.contains(&"window-center"));
    }
}
