//! Usage tracking - selection history with debounced persistence
//!
//! - `record` - UsageRecord, UsageKind and the frequency/recency score
//! - `store` - persistence backends (atomic JSON file, in-memory)
//! - `debounce` - background worker that coalesces writes
//! - `tracker` - the UsageTracker service shared with the dispatcher

mod debounce;
mod record;
mod store;
mod tracker;

pub use record::{usage_score, RecencyDecay, UsageKind, UsageRecord};
pub use store::{JsonFilePersistence, MemoryPersistence, UsageMap, UsagePersistence};
pub use tracker::UsageTracker;
