#![allow(dead_code)]

use chrono::NaiveDate;
use signalcast::domain::backtest::BacktestConfig;
use signalcast::domain::error::EngineError;
use signalcast::domain::macro_context::MacroResolver;
use signalcast::domain::price::{DataQuality, PricePoint, PriceSeries};
use signalcast::domain::sentiment::SentimentReading;
use signalcast::domain::settings::{EngineSettings, Settings, SnapshotBackend, StorageSettings};
use signalcast::domain::signal::{CacheSnapshot, ScoringConfig};
use signalcast::ports::price_port::PriceSource;
use signalcast::ports::sentiment_port::SentimentProvider;
use signalcast::ports::snapshot_port::SnapshotStore;
use signalcast::ports::watchlist_port::WatchlistStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct MockPriceSource {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    delay_ms: AtomicU64,
    fail_all: AtomicBool,
    fetches: AtomicUsize,
    lookbacks: Mutex<HashMap<String, usize>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            delay_ms: AtomicU64::new(0),
            fail_all: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            lookbacks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.data
            .insert(symbol.to_string(), PriceSeries::new(symbol, make_points(closes)));
        self
    }

    pub fn with_fallback_closes(mut self, symbol: &str, closes: &[f64]) -> Self {
        let series =
            PriceSeries::new(symbol, make_points(closes)).with_quality(DataQuality::Fallback);
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Every fetch sleeps this long, holding a blocking worker.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Lookback of the most recent fetch of `symbol`.
    pub fn last_lookback(&self, symbol: &str) -> Option<usize> {
        self.lookbacks.lock().unwrap().get(symbol).copied()
    }
}

impl PriceSource for MockPriceSource {
    fn fetch(&self, symbol: &str, lookback: usize) -> Result<PriceSeries, EngineError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.lookbacks
            .lock()
            .unwrap()
            .insert(symbol.to_string(), lookback);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(EngineError::data_unavailable(symbol, "source offline"));
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngineError::data_unavailable(symbol, reason.clone()));
        }
        match self.data.get(symbol) {
            Some(series) => Ok(series.clone().tail(lookback)),
            None => Err(EngineError::data_unavailable(symbol, "no such symbol")),
        }
    }
}

pub struct FixedSentiment(pub HashMap<String, SentimentReading>);

impl SentimentProvider for FixedSentiment {
    fn analyze(&self, symbol: &str) -> SentimentReading {
        self.0
            .get(symbol)
            .cloned()
            .unwrap_or_else(SentimentReading::neutral)
    }
}

pub struct StaticWatchlist(pub Vec<String>);

impl StaticWatchlist {
    pub fn of(symbols: &[&str]) -> Self {
        Self(symbols.iter().map(|s| s.to_string()).collect())
    }
}

impl WatchlistStore for StaticWatchlist {
    fn list(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.0.clone())
    }
}

pub struct FailingWatchlist;

impl WatchlistStore for FailingWatchlist {
    fn list(&self) -> Result<Vec<String>, EngineError> {
        Err(EngineError::Storage {
            reason: "watchlist backend down".into(),
        })
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    pub saved: Mutex<Option<CacheSnapshot>>,
    pub saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn holding(snapshot: CacheSnapshot) -> Self {
        Self {
            saved: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> Option<CacheSnapshot> {
        self.saved.lock().unwrap().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), EngineError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.saved.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<CacheSnapshot>, EngineError> {
        Ok(self.current())
    }
}

pub struct BrokenSnapshotStore;

impl SnapshotStore for BrokenSnapshotStore {
    fn save(&self, _snapshot: &CacheSnapshot) -> Result<(), EngineError> {
        Err(EngineError::Storage {
            reason: "disk full".into(),
        })
    }

    fn load(&self) -> Result<Option<CacheSnapshot>, EngineError> {
        Err(EngineError::Storage {
            reason: "corrupt".into(),
        })
    }
}

/// Daily bars starting 2024-01-01 with open = high = low = close.
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        })
        .collect()
}

/// 40 flat bars, a 20% drop, then a one-point-a-day recovery back to 100.
pub fn dip_and_recovery() -> Vec<f64> {
    let mut prices = vec![100.0; 40];
    prices.push(80.0);
    prices.extend((81..=100).map(f64::from));
    prices
}

pub fn settings(symbols: &[&str]) -> Settings {
    Settings {
        engine: EngineSettings {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            max_concurrency: 2,
            ..EngineSettings::default()
        },
        scoring: ScoringConfig::default(),
        macro_resolver: MacroResolver::default(),
        backtest: BacktestConfig::default(),
        storage: StorageSettings {
            data_dir: "data".into(),
            watchlist_path: None,
            backend: SnapshotBackend::Json,
            snapshot_path: "data/signals.json".into(),
        },
    }
}
