//! Daily price bars and the per-instrument series the engine consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a value was derived from genuine market data or from a substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    #[default]
    Real,
    Fallback,
}

impl DataQuality {
    pub fn is_fallback(self) -> bool {
        self == DataQuality::Fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Date-ordered daily bars for one instrument.
///
/// Dates are strictly increasing; gaps (market holidays) are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub quality: DataQuality,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, sorting by date and dropping repeated dates (last one wins).
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol: symbol.into(),
            quality: DataQuality::Real,
            points: deduped,
        }
    }

    pub fn with_quality(mut self, quality: DataQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Keeps only the most recent `count` bars.
    pub fn tail(mut self, count: usize) -> Self {
        if self.points.len() > count {
            let skip = self.points.len() - count;
            self.points.drain(..skip);
        }
        self
    }

    /// Close of the last bar dated on or before `date`.
    pub fn close_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn new_sorts_and_dedupes_dates() {
        let series = PriceSeries::new(
            "VOO",
            vec![
                point("2024-01-03", 3.0),
                point("2024-01-01", 1.0),
                point("2024-01-03", 4.0),
                point("2024-01-02", 2.0),
            ],
        );

        assert_eq!(series.closes(), vec![1.0, 2.0, 4.0]);
        assert_eq!(series.quality, DataQuality::Real);
    }

    #[test]
    fn tail_keeps_latest_bars() {
        let series = PriceSeries::new(
            "VOO",
            vec![
                point("2024-01-01", 1.0),
                point("2024-01-02", 2.0),
                point("2024-01-03", 3.0),
            ],
        )
        .tail(2);
        assert_eq!(series.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn close_on_or_before_handles_gaps() {
        let series = PriceSeries::new(
            "^VIX",
            vec![point("2024-01-02", 18.0), point("2024-01-05", 31.0)],
        );
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        assert_eq!(series.close_on_or_before(d("2024-01-01")), None);
        assert_eq!(series.close_on_or_before(d("2024-01-04")), Some(18.0));
        assert_eq!(series.close_on_or_before(d("2024-01-05")), Some(31.0));
    }

    #[test]
    fn quality_marker_is_carried() {
        let series = PriceSeries::new("VOO", vec![]).with_quality(DataQuality::Fallback);
        assert!(series.quality.is_fallback());
        assert!(series.is_empty());
    }
}
