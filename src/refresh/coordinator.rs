//! Refresh coordinator: schedules scoring batches over the instrument
//! universe and owns the result cache.
//!
//! At most one batch runs at a time. A caller that asks for a refresh while
//! one is in flight waits for it and receives its outcome (`joined: true`)
//! instead of starting a second batch. Batches run on their own task, so a
//! caller that stops waiting (timeout, dropped request) leaves the batch to
//! finish and commit. Readers never wait on a batch; they see the previous
//! snapshot until the new one is committed.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::cache::{CachedResults, ResultCache};
use crate::domain::error::EngineError;
use crate::domain::macro_context::{MacroContext, MacroResolver};
use crate::domain::settings::EngineSettings;
use crate::domain::signal::{CacheSnapshot, SignalResult, SignalScorer, SkippedSymbol};
use crate::domain::universe::merge_universe;
use crate::ports::price_port::PriceSource;
use crate::ports::sentiment_port::SentimentProvider;
use crate::ports::snapshot_port::SnapshotStore;
use crate::ports::watchlist_port::WatchlistStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub count: usize,
    pub skipped: usize,
    pub generation: u64,
    /// True when this caller received the result of a batch already running.
    pub joined: bool,
}

#[derive(Debug, Clone, Copy)]
enum LastRun {
    Committed(RefreshOutcome),
    Failed { attempted: usize },
}

impl LastRun {
    fn from_result(result: &Result<RefreshOutcome, EngineError>) -> Self {
        match result {
            Ok(outcome) => LastRun::Committed(*outcome),
            Err(EngineError::AllSymbolsFailed { attempted }) => LastRun::Failed {
                attempted: *attempted,
            },
            Err(_) => LastRun::Failed { attempted: 0 },
        }
    }

    fn into_result(self, joined: bool) -> Result<RefreshOutcome, EngineError> {
        match self {
            LastRun::Committed(outcome) => Ok(RefreshOutcome { joined, ..outcome }),
            LastRun::Failed { attempted } => Err(EngineError::AllSymbolsFailed { attempted }),
        }
    }
}

/// Outcome of a batch, `None` while it is still running.
type RunWatch = watch::Receiver<Option<LastRun>>;

/// Everything a blocking scoring worker needs, shared read-only.
struct ScoringJob {
    prices: Arc<dyn PriceSource>,
    sentiment: Arc<dyn SentimentProvider>,
    scorer: Arc<SignalScorer>,
    macro_context: MacroContext,
    lookback: usize,
    generated_at: DateTime<Utc>,
}

impl ScoringJob {
    fn score(&self, symbol: &str, watchlisted: bool) -> Result<SignalResult, EngineError> {
        let series = self.prices.fetch(symbol, self.lookback)?;
        if series.is_empty() {
            return Err(EngineError::data_unavailable(symbol, "price source returned no bars"));
        }
        let sentiment = self.sentiment.analyze(symbol);
        let result = self
            .scorer
            .score(&series, &self.macro_context, sentiment, self.generated_at)?;
        Ok(if watchlisted { result.watchlisted() } else { result })
    }
}

/// State a scoring batch needs. Owned by the spawned batch task as well as
/// the coordinator, so a batch outlives the caller that started it.
struct BatchRunner {
    prices: Arc<dyn PriceSource>,
    sentiment: Arc<dyn SentimentProvider>,
    watchlist: Arc<dyn WatchlistStore>,
    store: Option<Arc<dyn SnapshotStore>>,
    scorer: Arc<SignalScorer>,
    macro_resolver: MacroResolver,
    settings: EngineSettings,
    cache: ResultCache,
    batches_run: AtomicU64,
}

pub struct RefreshCoordinator {
    runner: Arc<BatchRunner>,
    cold_start: OnceCell<()>,
    in_flight: StdMutex<Option<RunWatch>>,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("settings", &self.runner.settings)
            .field("persistent", &self.runner.store.is_some())
            .field("batches_run", &self.batches_run())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        sentiment: Arc<dyn SentimentProvider>,
        watchlist: Arc<dyn WatchlistStore>,
        scorer: Arc<SignalScorer>,
        macro_resolver: MacroResolver,
        settings: EngineSettings,
    ) -> Self {
        RefreshCoordinator {
            runner: Arc::new(BatchRunner {
                prices,
                sentiment,
                watchlist,
                store: None,
                scorer,
                macro_resolver,
                settings,
                cache: ResultCache::new(),
                batches_run: AtomicU64::new(0),
            }),
            cold_start: OnceCell::new(),
            in_flight: StdMutex::new(None),
        }
    }

    /// Attaches a snapshot store. Must be called before the first refresh.
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        match Arc::get_mut(&mut self.runner) {
            Some(runner) => runner.store = Some(store),
            None => warn!("coordinator already shared, snapshot store not attached"),
        }
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.runner.settings
    }

    /// Number of scoring batches that actually executed.
    pub fn batches_run(&self) -> u64 {
        self.runner.batches_run.load(Ordering::SeqCst)
    }

    /// Configured symbols plus watch-listed ones, de-duplicated.
    pub fn universe(&self) -> Vec<String> {
        merge_universe(&self.runner.settings.symbols, &self.runner.watchlisted())
    }

    /// Last committed result set, or an empty `loading` set before the first commit.
    pub async fn get_cached_results(&self) -> CachedResults {
        self.ensure_loaded().await;
        self.runner.cache.read().await
    }

    pub async fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.ensure_loaded().await;
        self.runner.cache.snapshot().await
    }

    /// Loads the persisted snapshot once, if nothing is cached yet.
    pub async fn ensure_loaded(&self) {
        self.cold_start
            .get_or_init(|| async {
                let Some(store) = self.runner.store.clone() else {
                    return;
                };
                let loaded = tokio::task::spawn_blocking(move || store.load()).await;
                match loaded {
                    Ok(Ok(Some(snapshot))) => {
                        let generation = snapshot.generation;
                        let count = snapshot.len();
                        if self.runner.cache.seed(snapshot).await {
                            info!(generation, count, "restored persisted snapshot");
                        }
                    }
                    Ok(Ok(None)) => debug!("no persisted snapshot"),
                    Ok(Err(e)) => warn!(error = %e, "snapshot load failed, starting empty"),
                    Err(e) => warn!(error = %e, "snapshot load task failed, starting empty"),
                }
            })
            .await;
    }

    /// Runs one scoring batch, or joins the one already in flight.
    ///
    /// The batch runs on its own task: dropping the returned future stops
    /// the wait, never the batch.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, EngineError> {
        self.ensure_loaded().await;

        let (mut run, joined) = self.claim_run();
        if joined {
            debug!("joined in-flight refresh");
        }
        let outcome = run.wait_for(Option::is_some).await.map(|last| *last);
        match outcome {
            Ok(Some(last)) => last.into_result(joined),
            _ => Err(EngineError::RefreshAborted {
                reason: "batch task ended without reporting".to_string(),
            }),
        }
    }

    /// Returns a watch on the batch in flight, spawning one if none is running.
    fn claim_run(&self) -> (RunWatch, bool) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = slot.as_ref() {
            let pending = run.borrow().is_none();
            if pending && run.has_changed().is_ok() {
                return (run.clone(), true);
            }
        }

        let (tx, rx) = watch::channel(None);
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            let result = runner.run_batch().await;
            tx.send_replace(Some(LastRun::from_result(&result)));
        });
        *slot = Some(rx.clone());
        (rx, false)
    }

    /// Spawns the periodic refresh loop. The first tick fires immediately.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            interval_secs = self.runner.settings.refresh_interval.as_secs(),
            "starting refresh scheduler"
        );
        tokio::spawn(async move {
            self.ensure_loaded().await;
            let mut interval = tokio::time::interval(self.runner.settings.refresh_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh_now().await {
                    error!(error = %e, "scheduled refresh failed");
                }
            }
        })
    }
}

impl BatchRunner {
    fn watchlisted(&self) -> Vec<String> {
        match self.watchlist.list() {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(error = %e, "watchlist unavailable, treating as empty");
                Vec::new()
            }
        }
    }

    async fn run_batch(&self) -> Result<RefreshOutcome, EngineError> {
        self.batches_run.fetch_add(1, Ordering::SeqCst);

        let listed = self.watchlisted();
        let watchlisted: HashSet<String> =
            listed.iter().map(|s| s.trim().to_uppercase()).collect();
        let universe = merge_universe(&self.settings.symbols, &listed);
        let attempted = universe.len();
        let generated_at = Utc::now();
        info!(symbols = attempted, "refresh started");

        let macro_context = {
            let prices = Arc::clone(&self.prices);
            let resolver = self.macro_resolver.clone();
            tokio::task::spawn_blocking(move || resolver.resolve(prices.as_ref()))
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "macro task failed, using neutral fallback");
                    MacroContext::neutral_fallback()
                })
        };

        let job = Arc::new(ScoringJob {
            prices: Arc::clone(&self.prices),
            sentiment: Arc::clone(&self.sentiment),
            scorer: Arc::clone(&self.scorer),
            macro_context,
            lookback: self.settings.lookback_days,
            generated_at,
        });
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));

        let mut handles = Vec::with_capacity(attempted);
        for symbol in universe {
            let permit = Arc::clone(&semaphore).acquire_owned().await;
            let job = Arc::clone(&job);
            let listed = watchlisted.contains(&symbol);
            let task_symbol = symbol.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job.score(&task_symbol, listed)
            });
            handles.push((symbol, handle));
        }

        let mut results = BTreeMap::new();
        let mut skipped = Vec::new();
        for (symbol, handle) in handles {
            match handle.await {
                Ok(Ok(result)) => {
                    debug!(
                        symbol = %symbol,
                        score = result.score,
                        recommendation = %result.recommendation,
                        "scored"
                    );
                    results.insert(symbol, result);
                }
                Ok(Err(e)) => {
                    warn!(symbol = %symbol, error = %e, "skipping symbol this cycle");
                    skipped.push(SkippedSymbol {
                        symbol,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "scoring task failed");
                    skipped.push(SkippedSymbol {
                        symbol,
                        reason: format!("scoring task failed: {e}"),
                    });
                }
            }
        }

        if results.is_empty() {
            warn!(attempted, "every symbol failed, keeping previous snapshot");
            return Err(EngineError::AllSymbolsFailed { attempted });
        }

        let generation = self.cache.generation().await + 1;
        let outcome = RefreshOutcome {
            count: results.len(),
            skipped: skipped.len(),
            generation,
            joined: false,
        };
        let snapshot = self
            .cache
            .commit(CacheSnapshot {
                generation,
                generated_at,
                macro_context,
                results,
                skipped,
            })
            .await;
        info!(
            generation,
            count = outcome.count,
            skipped = outcome.skipped,
            macro_status = ?macro_context.status,
            "refresh committed"
        );

        self.persist(snapshot).await;
        Ok(outcome)
    }

    async fn persist(&self, snapshot: Arc<CacheSnapshot>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let generation = snapshot.generation;
        match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(Ok(())) => debug!(generation, "snapshot persisted"),
            Ok(Err(e)) => warn!(generation, error = %e, "snapshot persistence failed"),
            Err(e) => warn!(generation, error = %e, "snapshot persistence task failed"),
        }
    }
}
