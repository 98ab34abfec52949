//! Process-wide usage tracker
//!
//! Readers (`score`, `all_scores`) share a read lock; `record`, `remove`
//! and `clear` take the write lock, so no reader ever sees a half-updated
//! record. Persistence happens on the debounce worker.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::debounce::{PersistWorker, UsageShared};
use super::record::{usage_score, RecencyDecay, UsageKind, UsageRecord};
use super::store::{JsonFilePersistence, UsageMap, UsagePersistence};
use crate::config::UsageConfig;
use crate::error::{LauncherError, Result};

pub struct UsageTracker {
    shared: Arc<UsageShared>,
    worker: Mutex<Option<PersistWorker>>,
    decay: RecencyDecay,
    track_usage: bool,
    excluded: HashSet<String>,
}

impl UsageTracker {
    /// Tracker backed by the JSON file from `config` (or the per-user default)
    pub fn open(config: &UsageConfig) -> Self {
        let persistence = JsonFilePersistence::new(config.resolved_path());
        Self::with_persistence(config, Box::new(persistence))
    }

    /// Tracker over an explicit backend. Load failures start an empty store.
    pub fn with_persistence(config: &UsageConfig, persistence: Box<dyn UsagePersistence>) -> Self {
        let records = match persistence.load() {
            Ok(records) => records,
            Err(e) => {
                // A corrupt file is replaced on the next successful write
                warn!(
                    location = %persistence.location(),
                    error = %e,
                    "Usage data unreadable, starting with empty history"
                );
                UsageMap::new()
            }
        };

        info!(
            location = %persistence.location(),
            entry_count = records.len(),
            track_usage = config.track_usage,
            "Usage tracker ready"
        );

        let shared = Arc::new(UsageShared::new(records, persistence));
        let worker = PersistWorker::spawn(shared.clone(), config.debounce());

        UsageTracker {
            shared,
            worker: Mutex::new(Some(worker)),
            decay: RecencyDecay::from(config),
            track_usage: config.track_usage,
            excluded: config.excluded_identifiers.iter().cloned().collect(),
        }
    }

    /// Record a selection now. Returns false if the identifier is not tracked.
    pub fn record(&self, identifier: &str, kind: UsageKind) -> bool {
        self.record_at(identifier, kind, Utc::now())
    }

    /// Record a selection at an explicit time
    pub fn record_at(&self, identifier: &str, kind: UsageKind, now: DateTime<Utc>) -> bool {
        if !self.track_usage || identifier.is_empty() || self.excluded.contains(identifier) {
            debug!(identifier, "Usage not recorded (disabled or excluded)");
            return false;
        }

        let (count, generation) = {
            let mut records = self.shared.records.write();
            let count = match records.get_mut(identifier) {
                Some(record) => {
                    record.touch(kind, now);
                    record.count
                }
                None => {
                    records.insert(
                        identifier.to_string(),
                        UsageRecord::new(identifier, kind, now),
                    );
                    1
                }
            };
            (count, self.bump_generation())
        };

        debug!(identifier, count, "Recorded usage");
        self.schedule(generation);
        true
    }

    /// Forget one identifier. Returns whether it was present.
    pub fn remove(&self, identifier: &str) -> bool {
        let generation = {
            let mut records = self.shared.records.write();
            if records.remove(identifier).is_none() {
                return false;
            }
            self.bump_generation()
        };
        debug!(identifier, "Removed usage record");
        self.schedule(generation);
        true
    }

    /// Drop all history and persist immediately
    pub fn clear(&self) -> Result<()> {
        {
            let mut records = self.shared.records.write();
            records.clear();
            self.bump_generation();
        }
        info!("Cleared usage history");
        self.flush()
    }

    pub fn score(&self, identifier: &str) -> f64 {
        self.score_at(identifier, Utc::now())
    }

    pub fn score_at(&self, identifier: &str, now: DateTime<Utc>) -> f64 {
        self.shared
            .records
            .read()
            .get(identifier)
            .map(|record| usage_score(record, now, self.decay))
            .unwrap_or(0.0)
    }

    pub fn all_scores(&self) -> HashMap<String, f64> {
        self.all_scores_at(Utc::now())
    }

    pub fn all_scores_at(&self, now: DateTime<Utc>) -> HashMap<String, f64> {
        self.shared
            .records
            .read()
            .iter()
            .map(|(identifier, record)| (identifier.clone(), usage_score(record, now, self.decay)))
            .collect()
    }

    /// Highest scoring identifiers, score descending then identifier ascending
    pub fn top(&self, limit: usize) -> Vec<(UsageRecord, f64)> {
        let now = Utc::now();
        let mut items: Vec<(UsageRecord, f64)> = self
            .shared
            .records
            .read()
            .values()
            .map(|record| (record.clone(), usage_score(record, now, self.decay)))
            .collect();
        items.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.identifier.cmp(&b.0.identifier))
        });
        items.truncate(limit);
        items
    }

    pub fn get(&self, identifier: &str) -> Option<UsageRecord> {
        self.shared.records.read().get(identifier).cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.records.read().is_empty()
    }

    /// Changes on every mutation; used to invalidate cached rankings
    pub fn revision(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Whether changes are waiting to be written
    pub fn is_dirty(&self) -> bool {
        self.shared.is_dirty()
    }

    /// Write pending changes now instead of waiting for the debounce window
    pub fn flush(&self) -> Result<()> {
        let worker = self.worker.lock();
        let result = match worker.as_ref() {
            Some(worker) => worker.flush(),
            None => self.shared.write_if_dirty(),
        };
        match result {
            Ok(_) => Ok(()),
            Err(LauncherError::WorkerStopped) => {
                // Worker is gone; holding the lock keeps this the only writer
                self.shared.write_if_dirty().map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    /// Write pending changes and stop the worker. Later mutations are only
    /// persisted by an explicit `flush`.
    pub fn shutdown(&self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.shutdown();
        }
    }

    fn bump_generation(&self) -> u64 {
        self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn schedule(&self, generation: u64) {
        let worker = self.worker.lock();
        let scheduled = worker
            .as_ref()
            .is_some_and(|worker| worker.schedule(generation));
        if !scheduled {
            debug!(generation, "Persistence worker stopped, change kept in memory");
        }
    }
}

impl Drop for UsageTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::store::MemoryPersistence;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::thread;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn tracker_with(config: UsageConfig) -> (UsageTracker, Arc<MemoryPersistence>) {
        let memory = Arc::new(MemoryPersistence::new());
        let tracker = UsageTracker::with_persistence(&config, Box::new(memory.clone()));
        (tracker, memory)
    }

    fn tracker() -> (UsageTracker, Arc<MemoryPersistence>) {
        tracker_with(UsageConfig::default())
    }

    #[test]
    fn test_record_creates_then_increments() {
        let (tracker, _) = tracker();
        assert_eq!(tracker.score("app.x"), 0.0);

        assert!(tracker.record_at("app.x", UsageKind::Application, t0()));
        let first = tracker.get("app.x").unwrap();
        assert_eq!(first.count, 1);
        assert_eq!(first.first_used, first.last_used);

        let later = t0() + ChronoDuration::hours(3);
        tracker.record_at("app.x", UsageKind::Application, later);
        let second = tracker.get("app.x").unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.first_used, t0());
        assert_eq!(second.last_used, later);
    }

    #[test]
    fn test_count_strictly_increases() {
        let (tracker, _) = tracker();
        let mut last = 0;
        for _ in 0..20 {
            tracker.record_at("cmd", UsageKind::Command, t0());
            let count = tracker.get("cmd").unwrap().count;
            assert!(count > last);
            last = count;
        }
    }

    #[test]
    fn test_fifty_uses_today_saturates() {
        let (tracker, _) = tracker();
        for _ in 0..50 {
            tracker.record_at("app.X", UsageKind::Application, t0());
        }
        let score = tracker.score_at("app.X", t0() + ChronoDuration::hours(2));
        assert!(score >= 50.0);
        assert_eq!(crate::scoring::normalize_usage(score), 1.0);
    }

    #[test]
    fn test_recent_use_outscores_old_use() {
        let (tracker, _) = tracker();
        for _ in 0..3 {
            tracker.record_at("fresh", UsageKind::Command, t0());
            tracker.record_at("stale", UsageKind::Command, t0() - ChronoDuration::days(31));
        }
        let now = t0();
        assert!(tracker.score_at("fresh", now) >= tracker.score_at("stale", now));
        assert!(tracker.score_at("stale", now) > 0.0);
    }

    #[test]
    fn test_all_scores_covers_every_identifier() {
        let (tracker, _) = tracker();
        tracker.record_at("a", UsageKind::Command, t0());
        tracker.record_at("b", UsageKind::Application, t0());
        let scores = tracker.all_scores_at(t0());
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["a"], tracker.score_at("a", t0()));
    }

    #[test]
    fn test_excluded_and_disabled_tracking() {
        let (tracker, _) = tracker();
        assert!(!tracker.record("builtin-quit", UsageKind::Command));
        assert!(tracker.get("builtin-quit").is_none());

        let (disabled, _) = tracker_with(UsageConfig {
            track_usage: false,
            ..UsageConfig::default()
        });
        assert!(!disabled.record("app.x", UsageKind::Application));
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_existing_data_scores_when_tracking_disabled() {
        let mut seeded = UsageMap::new();
        seeded.insert(
            "app.x".to_string(),
            UsageRecord::new("app.x", UsageKind::Application, t0()),
        );
        let config = UsageConfig {
            track_usage: false,
            ..UsageConfig::default()
        };
        let tracker = UsageTracker::with_persistence(
            &config,
            Box::new(MemoryPersistence::with_records(seeded)),
        );
        assert!(tracker.score_at("app.x", t0()) > 0.0);
    }

    #[test]
    fn test_revision_changes_on_mutation() {
        let (tracker, _) = tracker();
        let r0 = tracker.revision();
        tracker.record("a", UsageKind::Command);
        let r1 = tracker.revision();
        assert!(r1 > r0);
        assert!(!tracker.remove("missing"));
        assert_eq!(tracker.revision(), r1);
        assert!(tracker.remove("a"));
        assert!(tracker.revision() > r1);
    }

    #[test]
    fn test_clear_persists_immediately() {
        let (tracker, memory) = tracker();
        tracker.record("a", UsageKind::Command);
        tracker.record("b", UsageKind::Command);

        tracker.clear().unwrap();
        assert!(tracker.is_empty());
        assert_eq!(memory.save_count(), 1);
        assert!(memory.snapshot().is_empty());
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_burst_of_records_writes_once_after_window() {
        let (tracker, memory) = tracker();

        // 10 selections within 200ms
        for i in 0..10 {
            tracker.record(&format!("item-{}", i % 3), UsageKind::Command);
            thread::sleep(Duration::from_millis(20));
        }
        let burst_end = std::time::Instant::now();

        thread::sleep(Duration::from_millis(500));
        assert_eq!(memory.save_count(), 0, "write must wait for the quiet period");

        while memory.save_count() == 0 && burst_end.elapsed() < Duration::from_secs(3) {
            thread::sleep(Duration::from_millis(20));
        }
        let elapsed = burst_end.elapsed();
        assert_eq!(memory.save_count(), 1);
        assert!(elapsed >= Duration::from_millis(900), "wrote after {:?}", elapsed);

        thread::sleep(Duration::from_millis(300));
        assert_eq!(memory.save_count(), 1);
        assert_eq!(memory.snapshot().len(), 3);
    }

    #[test]
    fn test_drop_flushes_pending_changes() {
        let memory = Arc::new(MemoryPersistence::new());
        {
            let tracker =
                UsageTracker::with_persistence(&UsageConfig::default(), Box::new(memory.clone()));
            tracker.record("a", UsageKind::Command);
        }
        assert_eq!(memory.save_count(), 1);
        assert!(memory.snapshot().contains_key("a"));
    }

    #[test]
    fn test_flush_after_shutdown_writes_inline() {
        let (tracker, memory) = tracker();
        tracker.shutdown();
        tracker.record("a", UsageKind::Command);
        assert!(tracker.is_dirty());
        tracker.flush().unwrap();
        assert_eq!(memory.save_count(), 1);
    }

    #[test]
    fn test_write_failure_keeps_memory_authoritative() {
        let (tracker, memory) = tracker();
        memory.set_fail_saves(true);
        tracker.record("a", UsageKind::Command);
        assert!(tracker.flush().is_err());
        assert!(tracker.is_dirty());
        assert_eq!(tracker.get("a").unwrap().count, 1);

        memory.set_fail_saves(false);
        tracker.flush().unwrap();
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_corrupt_file_starts_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");
        std::fs::write(&path, "not json at all").unwrap();

        let config = UsageConfig {
            path: Some(path.to_string_lossy().to_string()),
            ..UsageConfig::default()
        };
        let tracker = UsageTracker::open(&config);
        assert!(tracker.is_empty());

        tracker.record("a", UsageKind::Command);
        tracker.flush().unwrap();
        let reloaded = JsonFilePersistence::new(&path).load().unwrap();
        assert_eq!(reloaded["a"].count, 1);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let (tracker, _) = tracker();
        let tracker = Arc::new(tracker);

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.record("shared", UsageKind::Command);
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        if let Some(record) = tracker.get("shared") {
                            assert!(record.count >= 1);
                            assert!(record.first_used <= record.last_used);
                        }
                        let _ = tracker.all_scores();
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert_eq!(tracker.get("shared").unwrap().count, 400);
    }
}
