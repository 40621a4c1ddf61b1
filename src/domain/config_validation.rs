//! Configuration validation.
//!
//! Every section is checked before anything runs so a bad file fails fast
//! with the offending `[section] key`.

use tracing::warn;

use crate::domain::error::EngineError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const KNOWN_SECTIONS: [&str; 5] = ["engine", "scoring", "macro", "backtest", "storage"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    for section in unknown_sections(config) {
        warn!(section = %section, "ignoring unrecognised config section");
    }
    validate_engine_config(config)?;
    validate_scoring_config(config)?;
    validate_macro_config(config)?;
    validate_backtest_config(config)?;
    validate_storage_config(config)?;
    Ok(())
}

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_symbols(config)?;
    require_positive_int(config, "engine", "lookback_days", 300)?;
    require_positive_int(config, "engine", "refresh_interval_secs", 14_400)?;
    require_positive_int(config, "engine", "max_concurrency", 4)?;
    Ok(())
}

pub fn validate_scoring_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let oversold = config.get_double("scoring", "rsi_oversold", 30.0);
    let soft = config.get_double("scoring", "rsi_soft", 40.0);
    let overbought = config.get_double("scoring", "rsi_overbought", 70.0);
    for (key, value) in [
        ("rsi_oversold", oversold),
        ("rsi_soft", soft),
        ("rsi_overbought", overbought),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(EngineError::invalid_config(
                "scoring",
                key,
                "RSI thresholds must be between 0 and 100",
            ));
        }
    }
    if soft < oversold {
        return Err(EngineError::invalid_config(
            "scoring",
            "rsi_soft",
            "rsi_soft must not be below rsi_oversold",
        ));
    }

    let buy = config.get_double("scoring", "buy_threshold", 2.5);
    let sell = config.get_double("scoring", "sell_threshold", -1.0);
    if sell >= buy {
        return Err(EngineError::invalid_config(
            "scoring",
            "sell_threshold",
            "sell_threshold must be below buy_threshold",
        ));
    }

    if config.get_double("scoring", "bollinger_std_dev", 2.0) <= 0.0 {
        return Err(EngineError::invalid_config(
            "scoring",
            "bollinger_std_dev",
            "bollinger_std_dev must be positive",
        ));
    }
    Ok(())
}

pub fn validate_macro_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let fear = config.get_double("macro", "fear_threshold", 20.0);
    let extreme = config.get_double("macro", "extreme_fear_threshold", 30.0);
    if fear <= 0.0 {
        return Err(EngineError::invalid_config(
            "macro",
            "fear_threshold",
            "fear_threshold must be positive",
        ));
    }
    if extreme < fear {
        return Err(EngineError::invalid_config(
            "macro",
            "extreme_fear_threshold",
            "extreme_fear_threshold must not be below fear_threshold",
        ));
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if config.get_double("backtest", "initial_capital", 10_000.0) <= 0.0 {
        return Err(EngineError::invalid_config(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let stop_loss = config.get_double("backtest", "stop_loss_pct", 7.0);
    if stop_loss <= 0.0 || stop_loss >= 100.0 {
        return Err(EngineError::invalid_config(
            "backtest",
            "stop_loss_pct",
            "stop_loss_pct must be between 0 and 100",
        ));
    }

    if config.get_double("backtest", "take_profit_pct", 15.0) <= 0.0 {
        return Err(EngineError::invalid_config(
            "backtest",
            "take_profit_pct",
            "take_profit_pct must be positive",
        ));
    }

    require_positive_int(config, "backtest", "days", 365)?;
    if config.get_int("backtest", "warmup_bars", 200) < 0 {
        return Err(EngineError::invalid_config(
            "backtest",
            "warmup_bars",
            "warmup_bars must be non-negative",
        ));
    }

    let rate = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&rate) {
        return Err(EngineError::invalid_config(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

pub fn validate_storage_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let backend = config
        .get_string("storage", "backend")
        .unwrap_or_else(|| "json".to_string());
    match backend.trim().to_lowercase().as_str() {
        "json" => Ok(()),
        "sqlite" if cfg!(feature = "sqlite") => Ok(()),
        "sqlite" => Err(EngineError::invalid_config(
            "storage",
            "backend",
            "built without the sqlite feature",
        )),
        other => Err(EngineError::invalid_config(
            "storage",
            "backend",
            format!("unknown backend '{other}', expected json or sqlite"),
        )),
    }
}

/// Sections that no part of the engine reads, usually typos.
pub fn unknown_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| s != "default" && !KNOWN_SECTIONS.contains(&s.as_str()))
        .collect()
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), EngineError> {
    match config.get_string("engine", "symbols") {
        Some(s) if !s.trim().is_empty() => {
            parse_symbols(&s)?;
            Ok(())
        }
        _ => Err(EngineError::ConfigMissing {
            section: "engine".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn require_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), EngineError> {
    if config.get_int(section, key, default) <= 0 {
        return Err(EngineError::invalid_config(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(())
}
