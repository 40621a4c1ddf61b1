//! Computes the full indicator set for a price series and reads per-bar snapshots.

use serde::{Deserialize, Serialize};

use crate::domain::indicator::{
    bollinger, calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma, macd, rsi,
    IndicatorSeries,
};
use crate::domain::price::PriceSeries;

/// Window lengths for the indicators the scorer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_stddev_mult_x100: u32,
    pub sma_fast: usize,
    pub sma_slow: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_stddev_mult_x100: bollinger::DEFAULT_STDDEV_MULT_X100,
            sma_fast: 50,
            sma_slow: 200,
        }
    }
}

/// Latest-bar indicator values. `None` means the series was too short.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_upper: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
}

/// All indicator series for one price series, aligned bar-for-bar.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    len: usize,
    rsi: IndicatorSeries,
    macd: IndicatorSeries,
    bollinger: IndicatorSeries,
    sma_fast: IndicatorSeries,
    sma_slow: IndicatorSeries,
}

impl IndicatorFrame {
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> Self {
        let points = series.points();
        IndicatorFrame {
            len: points.len(),
            rsi: calculate_rsi(points, params.rsi_period),
            macd: calculate_macd(
                points,
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            ),
            bollinger: calculate_bollinger(
                points,
                params.bollinger_period,
                params.bollinger_stddev_mult_x100,
            ),
            sma_fast: calculate_sma(points, params.sma_fast),
            sma_slow: calculate_sma(points, params.sma_slow),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Indicator values as of bar `index`, using bars `0..=index` only.
    pub fn snapshot_at(&self, index: usize) -> IndicatorSnapshot {
        let macd = self.macd.macd_at(index);
        let bands = self.bollinger.bands_at(index);
        IndicatorSnapshot {
            rsi14: self.rsi.simple_at(index),
            macd_line: macd.map(|(line, _)| line),
            macd_signal: macd.map(|(_, signal)| signal),
            bb_lower: bands.map(|(lower, _, _)| lower),
            bb_upper: bands.map(|(_, _, upper)| upper),
            sma50: self.sma_fast.simple_at(index),
            sma200: self.sma_slow.simple_at(index),
        }
    }

    pub fn latest(&self) -> IndicatorSnapshot {
        match self.len.checked_sub(1) {
            Some(i) => self.snapshot_at(i),
            None => IndicatorSnapshot::default(),
        }
    }
}
