//! RSI (Relative Strength Index).
//!
//! Average gain and average loss are plain means over the last n day-over-day
//! deltas (rolling window, no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n deltas).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::price::PricePoint;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(points: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Rsi(period));
    }

    let mut values = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let valid = i >= period;
        let rsi = if valid {
            let window = &points[i - period..=i];
            let (gain_sum, loss_sum) =
                window
                    .windows(2)
                    .fold((0.0, 0.0), |(gains, losses), pair| {
                        let change = pair[1].close - pair[0].close;
                        if change > 0.0 {
                            (gains + change, losses)
                        } else {
                            (gains, losses - change)
                        }
                    });
            rsi_from_averages(gain_sum / period as f64, loss_sum / period as f64)
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
    rsi.clamp(0.0, 100.0)
}
