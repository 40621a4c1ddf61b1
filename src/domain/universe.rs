//! Instrument universe: parsing configured symbol lists, symbol syntax
//! checks, and merging in watch-listed symbols.

use crate::domain::error::EngineError;
use std::collections::HashSet;

pub const MAX_SYMBOL_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("malformed symbol: {0}")]
    Malformed(String),
}

impl From<UniverseError> for EngineError {
    fn from(err: UniverseError) -> Self {
        EngineError::invalid_config("engine", "symbols", err.to_string())
    }
}

/// Parses a comma-separated symbol list, upper-casing each entry.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !is_well_formed(&symbol) {
            return Err(UniverseError::Malformed(symbol));
        }
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Ticker-like: letters, digits and `.-^=`, at most [`MAX_SYMBOL_LEN`] chars.
pub fn is_well_formed(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

/// Normalizes a caller-supplied symbol, rejecting malformed input.
pub fn validate_symbol(raw: &str) -> Result<String, EngineError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(EngineError::InvalidSymbol {
            symbol,
            reason: "symbol is empty".to_string(),
        });
    }
    if !is_well_formed(&symbol) {
        return Err(EngineError::InvalidSymbol {
            symbol,
            reason: "unexpected characters or too long".to_string(),
        });
    }
    Ok(symbol)
}

/// Configured symbols followed by watch-listed ones not already present.
pub fn merge_universe(configured: &[String], watchlist: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    configured
        .iter()
        .chain(watchlist)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}
