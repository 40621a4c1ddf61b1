//! Typed engine settings built from a validated configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::backtest::BacktestConfig;
use crate::domain::config_validation::validate_config;
use crate::domain::error::EngineError;
use crate::domain::macro_context::{
    MacroResolver, MacroThresholds, DEFAULT_VOLATILITY_SYMBOL, DEFAULT_YIELD_SYMBOL,
};
use crate::domain::signal::ScoringConfig;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub symbols: Vec<String>,
    pub lookback_days: usize,
    pub refresh_interval: Duration,
    pub max_concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            symbols: Vec::new(),
            lookback_days: 300,
            refresh_interval: Duration::from_secs(14_400),
            max_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub watchlist_path: Option<PathBuf>,
    pub backend: SnapshotBackend,
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineSettings,
    pub scoring: ScoringConfig,
    pub macro_resolver: MacroResolver,
    pub backtest: BacktestConfig,
    pub storage: StorageSettings,
}

impl Settings {
    /// Validates the whole file, then reads each section with its defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        validate_config(config)?;
        Ok(Settings {
            engine: build_engine_settings(config)?,
            scoring: build_scoring_config(config),
            macro_resolver: build_macro_resolver(config),
            backtest: build_backtest_config(config),
            storage: build_storage_settings(config),
        })
    }
}

pub fn build_engine_settings(config: &dyn ConfigPort) -> Result<EngineSettings, EngineError> {
    let symbols_str = config
        .get_string("engine", "symbols")
        .ok_or_else(|| EngineError::ConfigMissing {
            section: "engine".to_string(),
            key: "symbols".to_string(),
        })?;

    Ok(EngineSettings {
        symbols: parse_symbols(&symbols_str)?,
        lookback_days: config.get_int("engine", "lookback_days", 300).max(1) as usize,
        refresh_interval: Duration::from_secs(
            config
                .get_int("engine", "refresh_interval_secs", 14_400)
                .max(1) as u64,
        ),
        max_concurrency: config.get_int("engine", "max_concurrency", 4).max(1) as usize,
    })
}

pub fn build_scoring_config(config: &dyn ConfigPort) -> ScoringConfig {
    let d = ScoringConfig::default();
    let get = |key: &str, default: f64| config.get_double("scoring", key, default);
    ScoringConfig {
        rsi_oversold: get("rsi_oversold", d.rsi_oversold),
        rsi_soft: get("rsi_soft", d.rsi_soft),
        rsi_overbought: get("rsi_overbought", d.rsi_overbought),
        oversold_points: get("oversold_points", d.oversold_points),
        soft_rsi_points: get("soft_rsi_points", d.soft_rsi_points),
        lower_band_points: get("lower_band_points", d.lower_band_points),
        macd_points: get("macd_points", d.macd_points),
        trend_points: get("trend_points", d.trend_points),
        fear_penalty: get("fear_penalty", d.fear_penalty),
        extreme_fear_penalty: get("extreme_fear_penalty", d.extreme_fear_penalty),
        news_points: get("news_points", d.news_points),
        buy_threshold: get("buy_threshold", d.buy_threshold),
        sell_threshold: get("sell_threshold", d.sell_threshold),
        bollinger_std_dev: get("bollinger_std_dev", d.bollinger_std_dev),
    }
}

pub fn build_macro_resolver(config: &dyn ConfigPort) -> MacroResolver {
    let volatility = config
        .get_string("macro", "volatility_symbol")
        .unwrap_or_else(|| DEFAULT_VOLATILITY_SYMBOL.to_string());
    let ten_year = config
        .get_string("macro", "yield_symbol")
        .unwrap_or_else(|| DEFAULT_YIELD_SYMBOL.to_string());
    let defaults = MacroThresholds::default();

    MacroResolver::new(
        volatility.trim(),
        ten_year.trim(),
        MacroThresholds {
            fear: config.get_double("macro", "fear_threshold", defaults.fear),
            extreme_fear: config.get_double(
                "macro",
                "extreme_fear_threshold",
                defaults.extreme_fear,
            ),
        },
    )
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    let d = BacktestConfig::default();
    BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", d.initial_capital),
        days: config.get_int("backtest", "days", d.days as i64).max(1) as usize,
        warmup_bars: config
            .get_int("backtest", "warmup_bars", d.warmup_bars as i64)
            .max(0) as usize,
        stop_loss_pct: config.get_double("backtest", "stop_loss_pct", d.stop_loss_pct),
        take_profit_pct: config.get_double("backtest", "take_profit_pct", d.take_profit_pct),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", d.risk_free_rate),
    }
}

pub fn build_storage_settings(config: &dyn ConfigPort) -> StorageSettings {
    let data_dir = config
        .get_string("storage", "data_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let backend = match config.get_string("storage", "backend") {
        Some(b) if b.trim().eq_ignore_ascii_case("sqlite") => SnapshotBackend::Sqlite,
        _ => SnapshotBackend::Json,
    };

    let snapshot_path = config
        .get_string("storage", "snapshot_path")
        .map(PathBuf::from)
        .unwrap_or_else(|| match backend {
            SnapshotBackend::Json => data_dir.join("signals.json"),
            SnapshotBackend::Sqlite => data_dir.join("signals.db"),
        });

    StorageSettings {
        watchlist_path: config.get_string("storage", "watchlist_path").map(PathBuf::from),
        data_dir,
        backend,
        snapshot_path,
    }
}
