//! Usage records and the frequency/recency score

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{UsageConfig, DEFAULT_RECENCY_FLOOR, DEFAULT_RECENCY_WINDOW_DAYS};

/// Category of a recorded selection, persisted as the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageKind {
    Application,
    Command,
    WebSearch,
}

/// Selection history for one identifier
///
/// Invariants: `count >= 1` and `first_used <= last_used`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: UsageKind,
    pub count: u32,
    pub last_used: DateTime<Utc>,
    pub first_used: DateTime<Utc>,
}

impl UsageRecord {
    /// A record for a first selection at `now`
    pub fn new(identifier: impl Into<String>, kind: UsageKind, now: DateTime<Utc>) -> Self {
        UsageRecord {
            identifier: identifier.into(),
            kind,
            count: 1,
            last_used: now,
            first_used: now,
        }
    }

    /// Count another selection at `now`
    pub fn touch(&mut self, kind: UsageKind, now: DateTime<Utc>) {
        self.count = self.count.saturating_add(1);
        self.kind = kind;
        // Clock skew must not break first_used <= last_used
        self.last_used = now.max(self.first_used);
    }

    /// Repair records loaded from disk so the invariants hold
    pub(crate) fn normalize(&mut self) {
        self.count = self.count.max(1);
        if self.first_used > self.last_used {
            self.first_used = self.last_used;
        }
    }
}

/// Recency decay parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyDecay {
    /// Days until the multiplier reaches the floor
    pub window_days: f64,
    /// Minimum multiplier for long-unused records
    pub floor: f64,
}

impl Default for RecencyDecay {
    fn default() -> Self {
        RecencyDecay {
            window_days: DEFAULT_RECENCY_WINDOW_DAYS,
            floor: DEFAULT_RECENCY_FLOOR,
        }
    }
}

impl From<&UsageConfig> for RecencyDecay {
    fn from(config: &UsageConfig) -> Self {
        RecencyDecay {
            window_days: config.recency_window_days,
            floor: config.recency_floor,
        }
    }
}

impl RecencyDecay {
    pub fn multiplier(&self, days_since_last_use: f64) -> f64 {
        let window = self.window_days.max(f64::EPSILON);
        (1.0 - days_since_last_use / window).max(self.floor)
    }
}

/// Whole days elapsed from `then` to `now`, never negative
fn days_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_days().max(0) as f64
}

/// Usage score of a record at `now`.
///
/// ```text
/// base      = count
/// recency   = max(floor, 1 - days_since_last / window)
/// frequency = days_since_first > 0 ? base / days_since_first : base
/// score     = (base * 0.5 + frequency * 100 * 0.5) * recency
/// ```
pub fn usage_score(record: &UsageRecord, now: DateTime<Utc>, decay: RecencyDecay) -> f64 {
    let base = record.count as f64;
    let recency = decay.multiplier(days_between(record.last_used, now));
    let days_since_first = days_between(record.first_used, now);
    let frequency = if days_since_first > 0.0 {
        base / days_since_first
    } else {
        base
    };
    (base * 0.5 + frequency * 100.0 * 0.5) * recency
}
