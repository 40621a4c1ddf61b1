//! Optional model-based price forecast port.

use crate::domain::forecast::ModelForecast;

pub trait ForecastProvider: Send + Sync {
    /// `None` when no trained model exists for `symbol`.
    fn predict(&self, symbol: &str) -> Option<ModelForecast>;
}
