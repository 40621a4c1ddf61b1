//! Population mean and standard deviation over a window of closes, used by
//! the Bollinger bands.

use crate::domain::price::PricePoint;

/// Mean and population standard deviation of the closes in `window`.
pub(crate) fn mean_and_stddev(window: &[PricePoint]) -> (f64, f64) {
    if window.is_empty() {
        return (0.0, 0.0);
    }
    let n = window.len() as f64;
    let mean = window.iter().map(|p| p.close).sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|p| {
            let diff = p.close - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}
