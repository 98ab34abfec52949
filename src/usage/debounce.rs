//! Debounced persistence worker
//!
//! A single background thread owns every write to the persistence backend.
//! Each mutation bumps a generation counter and sends `Schedule`; the worker
//! (re)arms its deadline on every message and only writes once the window
//! passes with no newer generation, so a burst of selections costs one write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::store::{UsageMap, UsagePersistence};
use crate::error::{LauncherError, Result};

/// State shared between the tracker and its persistence worker
pub(crate) struct UsageShared {
    pub records: RwLock<UsageMap>,
    /// Bumped under the write lock on every mutation
    pub generation: AtomicU64,
    /// Generation of the last successful write
    pub persisted: AtomicU64,
    pub persistence: Box<dyn UsagePersistence>,
}

impl UsageShared {
    pub fn new(records: UsageMap, persistence: Box<dyn UsagePersistence>) -> Self {
        UsageShared {
            records: RwLock::new(records),
            generation: AtomicU64::new(0),
            persisted: AtomicU64::new(0),
            persistence,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::SeqCst) > self.persisted.load(Ordering::SeqCst)
    }

    /// Write the current records if anything changed since the last write.
    ///
    /// Must only be called from one thread at a time (the worker, or the
    /// owner after the worker has exited).
    pub fn write_if_dirty(&self) -> Result<bool> {
        // Snapshot and generation are read together under the lock
        let (snapshot, generation) = {
            let records = self.records.read();
            (records.clone(), self.generation.load(Ordering::SeqCst))
        };
        if generation <= self.persisted.load(Ordering::SeqCst) {
            return Ok(false);
        }

        self.persistence.save(&snapshot)?;
        self.persisted.fetch_max(generation, Ordering::SeqCst);
        Ok(true)
    }
}

pub(crate) enum PersistRequest {
    /// A mutation with this generation happened; (re)start the quiet period
    Schedule(u64),
    /// Write now and report the outcome
    FlushNow(Sender<Result<bool>>),
    /// Write anything pending and exit
    Shutdown,
}

/// Handle to the running worker thread
pub(crate) struct PersistWorker {
    sender: Sender<PersistRequest>,
    handle: Option<JoinHandle<()>>,
}

impl PersistWorker {
    pub fn spawn(shared: Arc<UsageShared>, window: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("usage-persist".to_string())
            .spawn(move || run_worker(shared, receiver, window));

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                // Requests fail with WorkerStopped and the owner writes inline
                warn!(error = %e, "Failed to spawn usage persistence worker");
                None
            }
        };
        PersistWorker { sender, handle }
    }

    pub fn schedule(&self, generation: u64) -> bool {
        self.handle.is_some() && self.sender.send(PersistRequest::Schedule(generation)).is_ok()
    }

    /// Ask the worker to write immediately and wait for the result
    pub fn flush(&self) -> Result<bool> {
        if self.handle.is_none() {
            return Err(LauncherError::WorkerStopped);
        }
        let (reply_tx, reply_rx) = mpsc::channel();
        self.sender
            .send(PersistRequest::FlushNow(reply_tx))
            .map_err(|_| LauncherError::WorkerStopped)?;
        reply_rx.recv().map_err(|_| LauncherError::WorkerStopped)?
    }

    /// Stop the worker after it writes pending changes, and join it
    pub fn shutdown(mut self) {
        let _ = self.sender.send(PersistRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Usage persistence worker panicked");
            }
        }
    }
}

fn run_worker(shared: Arc<UsageShared>, receiver: Receiver<PersistRequest>, window: Duration) {
    debug!(window_ms = window.as_millis() as u64, "Usage persistence worker started");

    // Deadline and generation of the most recent Schedule request
    let mut pending: Option<(Instant, u64)> = None;

    loop {
        let message = match pending {
            Some((deadline, _)) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                receiver.recv_timeout(wait)
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match message {
            Ok(PersistRequest::Schedule(generation)) => {
                let latest = pending.map_or(generation, |(_, g)| g.max(generation));
                pending = Some((Instant::now() + window, latest));
            }
            Ok(PersistRequest::FlushNow(reply)) => {
                pending = None;
                let result = shared.write_if_dirty();
                log_write_result(&shared, &result, "flush");
                let _ = reply.send(result);
            }
            Ok(PersistRequest::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                let result = shared.write_if_dirty();
                log_write_result(&shared, &result, "shutdown");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                let Some((_, scheduled)) = pending else {
                    continue;
                };
                // A newer mutation whose Schedule is still in flight wins:
                // wait for its message to re-arm the timer instead of writing now.
                if shared.generation.load(Ordering::SeqCst) > scheduled {
                    pending = Some((Instant::now() + window, scheduled));
                    continue;
                }
                pending = None;
                let result = shared.write_if_dirty();
                log_write_result(&shared, &result, "debounce");
            }
        }
    }

    debug!("Usage persistence worker stopped");
}

fn log_write_result(shared: &UsageShared, result: &Result<bool>, trigger: &str) {
    match result {
        Ok(true) => info!(
            trigger,
            location = %shared.persistence.location(),
            "Persisted usage data"
        ),
        Ok(false) => debug!(trigger, "No usage changes to persist"),
        // In-memory state stays authoritative; the next cycle retries
        Err(e) => warn!(
            trigger,
            location = %shared.persistence.location(),
            error = %e,
            "Failed to persist usage data"
        ),
    }
}
