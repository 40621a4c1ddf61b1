//! CSV price file adapter.
//!
//! One file per symbol, `<data_dir>/<SYMBOL>.csv`, with a header row and the
//! columns `date,open,high,low,close,volume`.

use crate::domain::error::EngineError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvPriceSource {
    base_path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<T, EngineError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| EngineError::data_unavailable(symbol, format!("missing {name} column")))?
        .trim()
        .parse()
        .map_err(|e| EngineError::data_unavailable(symbol, format!("invalid {name} value: {e}")))
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, symbol: &str, lookback: usize) -> Result<PriceSeries, EngineError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            EngineError::data_unavailable(symbol, format!("failed to read {}: {e}", path.display()))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| {
                EngineError::data_unavailable(symbol, format!("CSV parse error: {e}"))
            })?;

            let date_str: String = parse_field(&record, 0, "date", symbol)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                EngineError::data_unavailable(symbol, format!("invalid date format: {e}"))
            })?;

            points.push(PricePoint {
                date,
                open: parse_field(&record, 1, "open", symbol)?,
                high: parse_field(&record, 2, "high", symbol)?,
                low: parse_field(&record, 3, "low", symbol)?,
                close: parse_field(&record, 4, "close", symbol)?,
                volume: parse_field::<f64>(&record, 5, "volume", symbol)? as i64,
            });
        }

        if points.is_empty() {
            return Err(EngineError::data_unavailable(symbol, "no rows in price file"));
        }

        Ok(PriceSeries::new(symbol, points).tail(lookback))
    }
}
