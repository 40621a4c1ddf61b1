//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::EngineError;
use crate::domain::settings::Settings;
use crate::engine::Engine;

#[derive(Parser, Debug)]
#[command(
    name = "signalcast",
    about = "Technical-indicator signal scoring and backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the universe once and print the result set
    Refresh {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Keep the result set fresh until interrupted
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the last persisted result set
    Results {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Backtest the scoring strategy on one symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        capital: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Refresh { config } => run_refresh(&config),
        Command::Serve { config } => run_serve(&config),
        Command::Results { config } => run_results(&config),
        Command::Backtest {
            config,
            symbol,
            days,
            capital,
        } => run_backtest(&config, &symbol, days, capital),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Loads and validates the configuration file into typed settings.
pub fn load_settings(path: &PathBuf) -> Result<Settings, ExitCode> {
    let adapter = load_config(path)?;
    Settings::from_config(&adapter).map_err(|e| fail(&e))
}

fn fail(err: &EngineError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn build_engine(config_path: &PathBuf) -> Result<(Settings, Engine), ExitCode> {
    let settings = load_settings(config_path)?;
    let engine = Engine::from_settings(&settings).map_err(|e| fail(&e))?;
    Ok((settings, engine))
}

fn runtime() -> Result<Runtime, ExitCode> {
    Runtime::new().map_err(|e| fail(&EngineError::Io(e)))
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&EngineError::Json(e)),
    }
}

fn run_refresh(config_path: &PathBuf) -> ExitCode {
    let (_, engine) = match build_engine(config_path) {
        Ok(built) => built,
        Err(code) => return code,
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let outcome = rt.block_on(async {
        let outcome = engine.refresh_now().await?;
        Ok::<_, EngineError>((outcome, engine.get_cached_results().await))
    });
    match outcome {
        Ok((outcome, cached)) => {
            eprintln!(
                "Scored {} symbols ({} skipped), generation {}",
                outcome.count, outcome.skipped, outcome.generation
            );
            print_json(&cached)
        }
        Err(e) => fail(&e),
    }
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    let (settings, engine) = match build_engine(config_path) {
        Ok(built) => built,
        Err(code) => return code,
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    rt.block_on(async {
        let coordinator = engine.coordinator();
        coordinator.ensure_loaded().await;
        info!(
            symbols = settings.engine.symbols.len(),
            interval_secs = settings.engine.refresh_interval.as_secs(),
            "refresh loop starting"
        );
        let handle = coordinator.start();

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
        info!("shutting down");
        handle.abort();
    });
    ExitCode::SUCCESS
}

fn run_results(config_path: &PathBuf) -> ExitCode {
    let (_, engine) = match build_engine(config_path) {
        Ok(built) => built,
        Err(code) => return code,
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let cached = rt.block_on(engine.get_cached_results());
    print_json(&cached)
}

fn run_backtest(
    config_path: &PathBuf,
    symbol: &str,
    days: Option<i64>,
    capital: Option<f64>,
) -> ExitCode {
    let (settings, engine) = match build_engine(config_path) {
        Ok(built) => built,
        Err(code) => return code,
    };
    let days = days.unwrap_or(settings.backtest.days as i64);
    let capital = capital.unwrap_or(settings.backtest.initial_capital);

    eprintln!("Backtesting {symbol} over {days} days with {capital:.2}");
    match engine.run_backtest(symbol, days, capital) {
        Ok(result) => {
            eprintln!(
                "Return {:.2}% vs buy-and-hold {:.2}%, {} trades",
                result.return_pct,
                result.benchmark_return_pct,
                result.trades.len()
            );
            print_json(&result)
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("  Symbols:  {}", settings.engine.symbols.join(", "));
    eprintln!(
        "  Refresh:  every {}s, {} workers",
        settings.engine.refresh_interval.as_secs(),
        settings.engine.max_concurrency
    );
    eprintln!(
        "  Scoring:  buy >= {}, sell <= {}",
        settings.scoring.buy_threshold, settings.scoring.sell_threshold
    );
    eprintln!(
        "  Storage:  {:?} at {}",
        settings.storage.backend,
        settings.storage.snapshot_path.display()
    );
    eprintln!("Config is valid.");
    ExitCode::SUCCESS
}
