//! Shortcuts to operating system settings panes

use super::{score_static_entries, QueryContext, ResultProvider, StaticEntry};
use crate::candidate::{CandidateAction, CandidateKind, Query, ScoredCandidate};

/// (id suffix, title, pane identifier, keywords)
const SETTINGS_PANES: &[(&str, &str, &str, &[&str])] = &[
    (
        "privacy",
        "Privacy & Security",
        "com.apple.preference.security",
        &["privacy", "security", "permissions", "firewall"],
    ),
    (
        "displays",
        "Displays",
        "com.apple.preference.displays",
        &["display", "monitor", "screen", "resolution", "brightness"],
    ),
    (
        "sound",
        "Sound",
        "com.apple.preference.sound",
        &["sound", "audio", "volume", "speaker", "microphone"],
    ),
    (
        "network",
        "Network",
        "com.apple.preference.network",
        &["network", "wifi", "wi-fi", "ethernet", "internet", "vpn"],
    ),
    (
        "keyboard",
        "Keyboard",
        "com.apple.preference.keyboard",
        &["keyboard", "keys", "input", "typing"],
    ),
    (
        "bluetooth",
        "Bluetooth",
        "com.apple.preference.bluetooth",
        &["bluetooth", "wireless", "devices", "pairing"],
    ),
    (
        "notifications",
        "Notifications",
        "com.apple.preference.notifications",
        &["notifications", "alerts", "do not disturb", "focus"],
    ),
    (
        "general",
        "General",
        "com.apple.preference.general",
        &["general", "about", "software update", "storage"],
    ),
    (
        "dock",
        "Desktop & Dock",
        "com.apple.preference.dock",
        &["dock", "desktop", "mission control"],
    ),
    (
        "battery",
        "Battery",
        "com.apple.preference.battery",
        &["battery", "power", "energy"],
    ),
    (
        "trackpad",
        "Trackpad",
        "com.apple.preference.trackpad",
        &["trackpad", "touchpad", "gestures", "scrolling"],
    ),
    (
        "appearance",
        "Appearance",
        "com.apple.preference.appearance",
        &["appearance", "dark mode", "light mode", "theme"],
    ),
];

pub struct SystemSettingsProvider {
    entries: Vec<StaticEntry>,
}

impl SystemSettingsProvider {
    pub fn new() -> Self {
        let entries = SETTINGS_PANES
            .iter()
            .map(|(id, title, pane, keywords)| {
                StaticEntry::new(
                    format!("settings-{}", id),
                    *title,
                    format!("Open {} settings", title),
                    keywords,
                    CandidateKind::Shortcut,
                    CandidateAction::OpenSettingsPane {
                        pane: pane.to_string(),
                    },
                )
            })
            .collect();
        SystemSettingsProvider { entries }
    }
}

impl Default for SystemSettingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultProvider for SystemSettingsProvider {
    fn name(&self) -> &'static str {
        "system-settings"
    }

    fn provide(&self, query: &Query, context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        Ok(score_static_entries(&self.entries, query, context))
    }
}
