//! Query dispatcher
//!
//! Every call to [`QueryDispatcher::search`] is one aggregation round:
//!
//! 1. take a round number (newer rounds supersede older ones)
//! 2. snapshot usage scores and the running-program set once
//! 3. run every provider on its own thread against that snapshot
//! 4. collect results until all providers report or the deadline passes
//! 5. dedup, sort, truncate, then append tail (fallback) entries
//! 6. publish only if no newer round has started
//!
//! Providers that fail, panic or miss the deadline contribute nothing.
//! Late threads run to completion and their output is dropped. Only rounds
//! in which every provider answered are cached.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::candidate::{CandidateKind, Query, RankedResults, ScoredCandidate};
use crate::config::Config;
use crate::error::LauncherError;
use crate::providers::{default_providers, AppCatalog, Placement, QueryContext, ResultProvider};
use crate::running::RunningAppsSource;
use crate::scoring::ScoreWeights;
use crate::usage::UsageTracker;

/// Tunables for one dispatcher, usually derived from [`Config`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOptions {
    pub max_results: usize,
    pub provider_timeout: Duration,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub weights: ScoreWeights,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        let ranking = config.get_ranking();
        let dispatch = config.get_dispatch();
        DispatchOptions {
            max_results: ranking.max_results,
            provider_timeout: dispatch.provider_timeout(),
            cache_capacity: dispatch.cache_capacity,
            cache_ttl: dispatch.cache_ttl(),
            weights: ScoreWeights::from(&ranking),
        }
    }
}

/// Ranked output kept for repeated queries
#[derive(Debug, Clone)]
struct CachedRanking {
    items: Vec<ScoredCandidate>,
    ranked_len: usize,
    usage_revision: u64,
    running: HashSet<String>,
    created: Instant,
}

type ProviderOutcome = std::thread::Result<anyhow::Result<Vec<ScoredCandidate>>>;

pub struct QueryDispatcher {
    providers: Vec<Arc<dyn ResultProvider>>,
    usage: Arc<UsageTracker>,
    catalog: Arc<AppCatalog>,
    running: Arc<dyn RunningAppsSource>,
    options: DispatchOptions,
    latest_round: AtomicU64,
    /// Last published round; replaced only by a newer round
    published: Mutex<Option<RankedResults>>,
    cache: Option<Mutex<LruCache<String, CachedRanking>>>,
    subscribers: Mutex<Vec<async_channel::Sender<RankedResults>>>,
}

impl QueryDispatcher {
    pub fn new(
        providers: Vec<Arc<dyn ResultProvider>>,
        usage: Arc<UsageTracker>,
        catalog: Arc<AppCatalog>,
        running: Arc<dyn RunningAppsSource>,
        options: DispatchOptions,
    ) -> Self {
        let cache = NonZeroUsize::new(options.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        QueryDispatcher {
            providers,
            usage,
            catalog,
            running,
            options,
            latest_round: AtomicU64::new(0),
            published: Mutex::new(None),
            cache,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Dispatcher with the providers enabled in `config`
    pub fn from_config(
        config: &Config,
        usage: Arc<UsageTracker>,
        catalog: Arc<AppCatalog>,
        running: Arc<dyn RunningAppsSource>,
    ) -> Self {
        let providers = default_providers(config, catalog.clone());
        Self::new(providers, usage, catalog, running, DispatchOptions::from(config))
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub fn catalog(&self) -> &Arc<AppCatalog> {
        &self.catalog
    }

    /// Run one aggregation round for `raw`.
    ///
    /// Returns `None` when a newer round started before this one finished;
    /// the stale results are discarded without being published.
    #[instrument(name = "dispatch_round", skip(self))]
    pub fn search(&self, raw: &str) -> Option<RankedResults> {
        let round = self.latest_round.fetch_add(1, Ordering::SeqCst) + 1;
        let query = Query::new(raw);
        let start = Instant::now();

        let results = if query.is_blank() {
            RankedResults {
                round,
                query: query.raw().to_string(),
                items: Vec::new(),
                ranked_len: 0,
            }
        } else {
            let usage_revision = self.usage.revision();
            let running = self.running.running_identifiers(&self.catalog.snapshot());
            if let Some(cached) = self.cached(&query, usage_revision, &running) {
                debug!(round, "Serving ranking from cache");
                RankedResults {
                    round,
                    query: query.raw().to_string(),
                    items: cached.items,
                    ranked_len: cached.ranked_len,
                }
            } else {
                let context = Arc::new(QueryContext {
                    usage_scores: self.usage.all_scores(),
                    running_identifiers: running,
                    weights: self.options.weights,
                });
                let (outputs, complete) = self.fan_out(round, &query, context.clone());
                let (items, ranked_len) = assemble(outputs, self.options.max_results);
                if complete {
                    self.store_cached(&query, &items, ranked_len, usage_revision, &context.running_identifiers);
                } else {
                    debug!(round, "Round incomplete; not cached");
                }
                RankedResults {
                    round,
                    query: query.raw().to_string(),
                    items,
                    ranked_len,
                }
            }
        };

        debug!(
            round,
            result_count = results.items.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregation round complete"
        );
        self.publish(results)
    }

    /// Most recently published results
    pub fn current(&self) -> Option<RankedResults> {
        self.published.lock().clone()
    }

    /// Round number of the newest search started
    pub fn latest_round(&self) -> u64 {
        self.latest_round.load(Ordering::SeqCst)
    }

    /// Receive every published round
    pub fn subscribe(&self) -> async_channel::Receiver<RankedResults> {
        let (sender, receiver) = async_channel::unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Record that the user picked `identifier`; call before running its action
    pub fn record_selection(&self, identifier: &str, kind: CandidateKind) -> bool {
        let recorded = self.usage.record(identifier, kind.usage_kind());
        debug!(identifier, recorded, "Selection recorded");
        recorded
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    /// Cached ranking for the exact query text, if usage and running state are unchanged
    fn cached(&self, query: &Query, usage_revision: u64, running: &HashSet<String>) -> Option<CachedRanking> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock();
        let key = cache_key(query);
        let entry = cache.get(key)?;
        let fresh = entry.usage_revision == usage_revision
            && entry.running == *running
            && entry.created.elapsed() < self.options.cache_ttl;
        if fresh {
            return Some(entry.clone());
        }
        cache.pop(key);
        None
    }

    fn store_cached(
        &self,
        query: &Query,
        items: &[ScoredCandidate],
        ranked_len: usize,
        usage_revision: u64,
        running: &HashSet<String>,
    ) {
        if let Some(cache) = &self.cache {
            cache.lock().put(
                cache_key(query).to_string(),
                CachedRanking {
                    items: items.to_vec(),
                    ranked_len,
                    usage_revision,
                    running: running.clone(),
                    created: Instant::now(),
                },
            );
        }
    }

    /// Run all providers concurrently; results arrive in provider order.
    ///
    /// The flag is true when every provider answered with `Ok` before the deadline.
    fn fan_out(
        &self,
        round: u64,
        query: &Query,
        context: Arc<QueryContext>,
    ) -> (Vec<(Placement, Vec<ScoredCandidate>)>, bool) {
        let (sender, receiver) = mpsc::channel::<(usize, ProviderOutcome)>();
        let query = Arc::new(query.clone());
        let mut pending: Vec<Option<&Arc<dyn ResultProvider>>> = Vec::with_capacity(self.providers.len());

        for (index, provider) in self.providers.iter().enumerate() {
            let task_provider = provider.clone();
            let task_query = query.clone();
            let task_context = context.clone();
            let task_sender = sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("provider-{}", provider.name()))
                .spawn(move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        task_provider.provide(&task_query, &task_context)
                    }));
                    // Receiver is gone if the round already timed out
                    let _ = task_sender.send((index, outcome));
                });
            match spawned {
                Ok(_) => pending.push(Some(provider)),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Failed to start provider");
                    pending.push(None);
                }
            }
        }
        drop(sender);

        let mut complete = pending.iter().all(Option::is_some);
        let mut outputs: Vec<Option<Vec<ScoredCandidate>>> = vec![None; self.providers.len()];
        let mut outstanding = pending.iter().filter(|p| p.is_some()).count();
        let deadline = Instant::now() + self.options.provider_timeout;

        while outstanding > 0 {
            let wait = deadline.saturating_duration_since(Instant::now());
            let (index, outcome) = match receiver.recv_timeout(wait) {
                Ok(message) => message,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    complete = false;
                    for provider in pending.iter().flatten() {
                        warn!(
                            round,
                            provider = provider.name(),
                            timeout_ms = self.options.provider_timeout.as_millis() as u64,
                            "Provider timed out; continuing without it"
                        );
                    }
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    complete = false;
                    break;
                }
            };
            outstanding -= 1;
            let Some(provider) = pending[index].take() else {
                continue;
            };

            match outcome {
                Ok(Ok(candidates)) => {
                    debug!(round, provider = provider.name(), count = candidates.len(), "Provider finished");
                    outputs[index] = Some(candidates);
                }
                Ok(Err(e)) => {
                    complete = false;
                    let error = LauncherError::Provider {
                        provider: provider.name().to_string(),
                        message: format!("{:#}", e),
                    };
                    warn!(round, error = %error, "Provider failed; continuing with remaining providers");
                }
                Err(_) => {
                    complete = false;
                    let error = LauncherError::ProviderPanicked {
                        provider: provider.name().to_string(),
                    };
                    warn!(round, error = %error, "Provider panicked; continuing with remaining providers");
                }
            }
        }

        let outputs = self
            .providers
            .iter()
            .zip(outputs)
            .filter_map(|(provider, output)| output.map(|items| (provider.placement(), items)))
            .collect();
        (outputs, complete)
    }

    /// Publish unless a newer round has started or already published
    fn publish(&self, results: RankedResults) -> Option<RankedResults> {
        let mut published = self.published.lock();

        let superseded = results.round != self.latest_round.load(Ordering::SeqCst)
            || published
                .as_ref()
                .is_some_and(|current| current.round > results.round);
        if superseded {
            debug!(
                round = results.round,
                latest = self.latest_round.load(Ordering::SeqCst),
                query = %results.query,
                "Discarding stale round"
            );
            return None;
        }

        *published = Some(results.clone());
        drop(published);

        self.subscribers
            .lock()
            .retain(|sender| sender.try_send(results.clone()).is_ok());
        Some(results)
    }
}

/// Cache key: the trimmed query text, case preserved
fn cache_key(query: &Query) -> &str {
    query.raw().trim()
}

/// Split provider output into ranked and tail lists and build the final order
fn assemble(outputs: Vec<(Placement, Vec<ScoredCandidate>)>, max_results: usize) -> (Vec<ScoredCandidate>, usize) {
    let mut ranked_input = Vec::new();
    let mut tail = Vec::new();
    for (placement, items) in outputs {
        match placement {
            Placement::Ranked => ranked_input.extend(items),
            Placement::Tail => tail.extend(items),
        }
    }

    let mut items = rank(ranked_input, max_results);
    let ranked_len = items.len();

    let mut seen: HashSet<String> = items.iter().map(|item| item.candidate.id.clone()).collect();
    for item in tail {
        if seen.insert(item.candidate.id.clone()) {
            items.push(item);
        }
    }
    (items, ranked_len)
}

/// Deterministic ranking: one entry per identifier (highest score wins),
/// score descending, then title, then identifier, truncated to `max_results`.
pub fn rank(candidates: Vec<ScoredCandidate>, max_results: usize) -> Vec<ScoredCandidate> {
    let mut best: HashMap<String, ScoredCandidate> = HashMap::with_capacity(candidates.len());
    for item in candidates {
        match best.get(&item.candidate.id) {
            Some(existing) if compare(existing, &item).is_le() => {}
            _ => {
                best.insert(item.candidate.id.clone(), item);
            }
        }
    }

    let mut ranked: Vec<ScoredCandidate> = best.into_values().collect();
    ranked.sort_by(compare);
    ranked.truncate(max_results);
    ranked
}

fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> std::cmp::Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate.title.cmp(&b.candidate.title))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
        .then_with(|| a.candidate.subtitle.cmp(&b.candidate.subtitle))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
