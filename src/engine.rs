//! Engine assembly and the caller-facing operations.
//!
//! Every collaborator is passed in explicitly; [`Engine::from_settings`] wires
//! the file-backed adapters for the command-line front end.

use std::sync::Arc;

use tracing::info;

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::json_snapshot_adapter::JsonSnapshotStore;
use crate::adapters::json_watchlist_adapter::{EmptyWatchlist, JsonWatchlistStore};
use crate::adapters::neutral_sentiment::NeutralSentiment;
use crate::domain::backtest::{self as simulator, BacktestConfig, BacktestResult};
use crate::domain::error::EngineError;
use crate::domain::macro_context::MacroResolver;
use crate::domain::settings::{Settings, SnapshotBackend, StorageSettings};
use crate::domain::signal::SignalScorer;
use crate::domain::universe::validate_symbol;
use crate::ports::forecast_port::ForecastProvider;
use crate::ports::price_port::PriceSource;
use crate::ports::sentiment_port::SentimentProvider;
use crate::ports::snapshot_port::SnapshotStore;
use crate::ports::watchlist_port::WatchlistStore;
use crate::refresh::{CachedResults, RefreshCoordinator, RefreshOutcome};

/// External collaborators the engine is built from.
pub struct Collaborators {
    pub prices: Arc<dyn PriceSource>,
    pub sentiment: Arc<dyn SentimentProvider>,
    pub watchlist: Arc<dyn WatchlistStore>,
    pub store: Option<Arc<dyn SnapshotStore>>,
    pub forecast: Option<Arc<dyn ForecastProvider>>,
}

impl Collaborators {
    /// Collaborators with neutral sentiment, no watchlist, no persistence and no model.
    pub fn with_prices(prices: Arc<dyn PriceSource>) -> Self {
        Collaborators {
            prices,
            sentiment: Arc::new(NeutralSentiment),
            watchlist: Arc::new(EmptyWatchlist),
            store: None,
            forecast: None,
        }
    }
}

pub struct Engine {
    prices: Arc<dyn PriceSource>,
    scorer: Arc<SignalScorer>,
    macro_resolver: MacroResolver,
    backtest: BacktestConfig,
    coordinator: Arc<RefreshCoordinator>,
}

impl Engine {
    pub fn new(settings: &Settings, collaborators: Collaborators) -> Self {
        let Collaborators {
            prices,
            sentiment,
            watchlist,
            store,
            forecast,
        } = collaborators;

        let mut scorer = SignalScorer::new(settings.scoring.clone());
        if let Some(provider) = forecast {
            scorer = scorer.with_forecast(provider);
        }
        let scorer = Arc::new(scorer);

        let mut coordinator = RefreshCoordinator::new(
            Arc::clone(&prices),
            sentiment,
            watchlist,
            Arc::clone(&scorer),
            settings.macro_resolver.clone(),
            settings.engine.clone(),
        );
        if let Some(store) = store {
            coordinator = coordinator.with_store(store);
        }

        Engine {
            prices,
            scorer,
            macro_resolver: settings.macro_resolver.clone(),
            backtest: settings.backtest.clone(),
            coordinator: Arc::new(coordinator),
        }
    }

    /// Builds the engine on CSV prices, the configured watchlist file and snapshot backend.
    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        let storage = &settings.storage;
        let watchlist: Arc<dyn WatchlistStore> = match &storage.watchlist_path {
            Some(path) => Arc::new(JsonWatchlistStore::new(path)),
            None => Arc::new(EmptyWatchlist),
        };
        let collaborators = Collaborators {
            prices: Arc::new(CsvPriceSource::new(&storage.data_dir)),
            sentiment: Arc::new(NeutralSentiment),
            watchlist,
            store: Some(open_store(storage)?),
            forecast: None,
        };
        info!(
            data_dir = %storage.data_dir.display(),
            snapshot = %storage.snapshot_path.display(),
            "engine configured"
        );
        Ok(Self::new(settings, collaborators))
    }

    pub fn coordinator(&self) -> Arc<RefreshCoordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn scorer(&self) -> &SignalScorer {
        &self.scorer
    }

    pub async fn get_cached_results(&self) -> CachedResults {
        self.coordinator.get_cached_results().await
    }

    pub async fn refresh_now(&self) -> Result<RefreshOutcome, EngineError> {
        self.coordinator.refresh_now().await
    }

    /// Simulates the scoring strategy over the last `days` bars of `symbol`.
    ///
    /// The symbol must be well formed and part of the current universe.
    pub fn run_backtest(
        &self,
        symbol: &str,
        days: i64,
        initial_capital: f64,
    ) -> Result<BacktestResult, EngineError> {
        let symbol = validate_symbol(symbol)?;
        if !self.coordinator.universe().contains(&symbol) {
            return Err(EngineError::InvalidSymbol {
                symbol,
                reason: "not in the configured universe or watchlist".to_string(),
            });
        }

        let days = usize::try_from(days).map_err(|_| EngineError::Simulation {
            reason: format!("days must be positive, got {days}"),
        })?;
        let config = BacktestConfig {
            days,
            initial_capital,
            ..self.backtest.clone()
        };
        config.validate()?;

        let series = self.prices.fetch(&symbol, config.fetch_window())?;
        let history = self
            .macro_resolver
            .history(self.prices.as_ref(), config.macro_window());
        let result = simulator::run_backtest(&series, &history, &self.scorer, &config)?;

        info!(
            symbol = %result.symbol,
            trades = result.trades.len(),
            return_pct = result.return_pct,
            "backtest complete"
        );
        Ok(result)
    }
}

fn open_store(storage: &StorageSettings) -> Result<Arc<dyn SnapshotStore>, EngineError> {
    match storage.backend {
        SnapshotBackend::Json => Ok(Arc::new(JsonSnapshotStore::new(&storage.snapshot_path))),
        #[cfg(feature = "sqlite")]
        SnapshotBackend::Sqlite => {
            use crate::adapters::sqlite_adapter::SqliteSnapshotStore;
            Ok(Arc::new(SqliteSnapshotStore::open(&storage.snapshot_path)?))
        }
        #[cfg(not(feature = "sqlite"))]
        SnapshotBackend::Sqlite => Err(EngineError::invalid_config(
            "storage",
            "backend",
            "sqlite feature is not enabled",
        )),
    }
}
