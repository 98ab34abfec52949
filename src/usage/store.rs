//! Usage persistence backends
//!
//! The on-disk format is a JSON object keyed by identifier:
//!
//! ```json
//! {"com.google.Chrome":{"identifier":"com.google.Chrome","type":"application","count":3,
//!   "lastUsed":"2025-03-01T12:00:00Z","firstUsed":"2025-02-20T08:30:00Z"}}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use super::record::UsageRecord;
use crate::error::{LauncherError, Result};

pub type UsageMap = HashMap<String, UsageRecord>;

/// Durable storage for the usage map.
///
/// Implementations are only ever called from one thread at a time for
/// writes (the persistence worker), but must be `Send + Sync` so the
/// tracker can be shared.
pub trait UsagePersistence: Send + Sync {
    /// Load all records. A missing store is an empty map, not an error.
    fn load(&self) -> Result<UsageMap>;

    /// Replace the stored records with `records`
    fn save(&self, records: &UsageMap) -> Result<()>;

    /// Human readable location for logs
    fn location(&self) -> String;
}

/// JSON file written atomically (temp file + rename)
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFilePersistence { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl UsagePersistence for JsonFilePersistence {
    #[instrument(name = "usage_load", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<UsageMap> {
        if !self.path.exists() {
            info!("Usage file not found, starting fresh");
            return Ok(UsageMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| LauncherError::usage_store(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(UsageMap::new());
        }

        let mut records: UsageMap = serde_json::from_str(&content)?;
        for (identifier, record) in records.iter_mut() {
            // The map key is authoritative
            if record.identifier != *identifier {
                record.identifier = identifier.clone();
            }
            record.normalize();
        }

        info!(entry_count = records.len(), "Loaded usage data");
        Ok(records)
    }

    #[instrument(name = "usage_save", skip(self, records), fields(path = %self.path.display()))]
    fn save(&self, records: &UsageMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::usage_store(parent, e))?;
        }

        // Sorted keys keep the file stable between writes
        let ordered: BTreeMap<&String, &UsageRecord> = records.iter().collect();
        let json = serde_json::to_string(&ordered)?;

        let temp_path = self.temp_path();
        std::fs::write(&temp_path, &json)
            .map_err(|e| LauncherError::usage_store(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| LauncherError::usage_store(&self.path, e))?;

        debug!(
            entry_count = records.len(),
            bytes = json.len(),
            "Saved usage data (atomic)"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend that counts writes. Used by tests and by embedders
/// that don't want usage on disk.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    records: Mutex<UsageMap>,
    saves: AtomicUsize,
    fail_saves: std::sync::atomic::AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: UsageMap) -> Self {
        MemoryPersistence {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last saved state
    pub fn snapshot(&self) -> UsageMap {
        self.records.lock().clone()
    }

    /// Make subsequent saves fail, simulating a full disk
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl UsagePersistence for MemoryPersistence {
    fn load(&self) -> Result<UsageMap> {
        Ok(self.records.lock().clone())
    }

    fn save(&self, records: &UsageMap) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(LauncherError::usage_store(
                "memory",
                std::io::Error::other("simulated write failure"),
            ));
        }
        *self.records.lock() = records.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

impl<T: UsagePersistence + ?Sized> UsagePersistence for std::sync::Arc<T> {
    fn load(&self) -> Result<UsageMap> {
        (**self).load()
    }

    fn save(&self, records: &UsageMap) -> Result<()> {
        (**self).save(records)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
