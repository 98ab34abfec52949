//! Which catalog applications are currently running

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sysinfo::System;
use tracing::debug;

use crate::providers::AppInfo;

/// Source of the running-program set captured at the start of each round
pub trait RunningAppsSource: Send + Sync {
    /// Identifiers of the `apps` that have a live process
    fn running_identifiers(&self, apps: &[AppInfo]) -> HashSet<String>;
}

/// Default age after which the process table is scanned again
pub const DEFAULT_PROCESS_REFRESH: Duration = Duration::from_millis(1000);

/// Process table scan via `sysinfo`.
///
/// An app is running when a process executable lives inside its bundle
/// path, or when a process name equals the app's executable name. The
/// table is rescanned at most once per refresh interval; rounds in between
/// reuse the last scan.
pub struct ProcessRunningApps {
    state: Mutex<ProcessTable>,
    refresh_interval: Duration,
}

struct ProcessTable {
    system: System,
    exes: Vec<PathBuf>,
    names: HashSet<String>,
    refreshed_at: Option<Instant>,
    scans: usize,
}

impl ProcessTable {
    fn is_stale(&self, interval: Duration) -> bool {
        self.refreshed_at.map_or(true, |at| at.elapsed() >= interval)
    }

    fn rescan(&mut self) {
        self.system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        self.exes.clear();
        self.names.clear();
        for process in self.system.processes().values() {
            if let Some(exe) = process.exe() {
                self.exes.push(exe.to_path_buf());
            }
            self.names.insert(process.name().to_string_lossy().to_string());
        }
        self.refreshed_at = Some(Instant::now());
        self.scans += 1;
    }
}

impl ProcessRunningApps {
    pub fn new() -> Self {
        Self::with_refresh_interval(DEFAULT_PROCESS_REFRESH)
    }

    pub fn with_refresh_interval(refresh_interval: Duration) -> Self {
        ProcessRunningApps {
            state: Mutex::new(ProcessTable {
                system: System::new(),
                exes: Vec::new(),
                names: HashSet::new(),
                refreshed_at: None,
                scans: 0,
            }),
            refresh_interval,
        }
    }
}

impl Default for ProcessRunningApps {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningAppsSource for ProcessRunningApps {
    fn running_identifiers(&self, apps: &[AppInfo]) -> HashSet<String> {
        if apps.is_empty() {
            return HashSet::new();
        }
        let mut table = self.state.lock();
        if table.is_stale(self.refresh_interval) {
            table.rescan();
            debug!(process_count = table.names.len(), "Rescanned process table");
        }
        match_running(apps, &table.exes, &table.names)
    }
}

fn match_running(apps: &[AppInfo], exes: &[PathBuf], names: &HashSet<String>) -> HashSet<String> {
    apps.iter()
        .filter(|app| {
            let in_bundle = app.path.extension().is_some_and(|ext| ext == "app")
                && exes.iter().any(|exe| exe.starts_with(&app.path));
            let by_name = app
                .executable
                .as_ref()
                .is_some_and(|executable| names.contains(executable));
            in_bundle || by_name
        })
        .map(|app| app.id.clone())
        .collect()
}

/// Fixed running set, for tests and hosts that track processes themselves
#[derive(Debug, Default)]
pub struct StaticRunningApps {
    identifiers: Mutex<HashSet<String>>,
}

impl StaticRunningApps {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StaticRunningApps {
            identifiers: Mutex::new(identifiers.into_iter().map(Into::into).collect()),
        }
    }

    pub fn set<I, S>(&self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.identifiers.lock() = identifiers.into_iter().map(Into::into).collect();
    }
}

impl RunningAppsSource for StaticRunningApps {
    fn running_identifiers(&self, _apps: &[AppInfo]) -> HashSet<String> {
        self.identifiers.lock().clone()
    }
}
