use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::window::{TimeWindow, WindowEnd};
use crate::error::ChartError;

/// One closing price on one calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily close series, oldest first. Once built through [`PriceSeries::normalize`]
/// consecutive points are exactly one calendar day apart (no gaps, no duplicates).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

/// Absolute and percentage change between the two most recent closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayChange {
    pub absolute: f64,
    pub percent: f64,
}

impl PriceSeries {
    /// Build a gapless daily series from raw API output.
    ///
    /// Walks consecutive date pairs; whenever the gap exceeds one day,
    /// synthesizes intermediate entries carrying the earlier close forward
    /// (last observation carried forward). The final raw point is always kept
    /// unchanged.
    pub fn normalize(dates: &[NaiveDate], prices: &[f64]) -> Result<Self, ChartError> {
        if dates.len() != prices.len() {
            return Err(ChartError::InvalidInput(format!(
                "{} dates vs {} prices",
                dates.len(),
                prices.len()
            )));
        }
        if dates.is_empty() {
            return Err(ChartError::InvalidInput("empty series".to_string()));
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ChartError::InvalidInput(format!(
                    "dates not strictly increasing: {} then {}",
                    pair[0], pair[1]
                )));
            }
        }

        let mut points = Vec::with_capacity(dates.len());
        for i in 0..dates.len() - 1 {
            points.push(PricePoint {
                date: dates[i],
                close: prices[i],
            });

            let mut day = dates[i] + Days::new(1);
            while day < dates[i + 1] {
                points.push(PricePoint {
                    date: day,
                    close: prices[i],
                });
                day = day + Days::new(1);
            }
        }
        points.push(PricePoint {
            date: dates[dates.len() - 1],
            close: prices[prices.len() - 1],
        });

        Ok(Self { points })
    }

    /// Wrap already-normalized points (e.g. reloaded from the cache blob).
    pub fn from_points(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    /// Contiguous sub-series inside `window`. Lookup is binary search on the
    /// sorted dates; a window that misses the series entirely yields an empty
    /// series, not an error.
    pub fn slice(&self, window: &TimeWindow, today: NaiveDate) -> PriceSeries {
        let start = self.points.partition_point(|p| p.date < window.start);
        let end = match window.end {
            WindowEnd::Date(end) => self.points.partition_point(|p| p.date <= end),
            WindowEnd::Open => self.points.partition_point(|p| p.date <= today),
        };
        if start >= end {
            return PriceSeries::default();
        }
        PriceSeries {
            points: self.points[start..end].to_vec(),
        }
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

    /// The most recent point; the "today" reference price comes from here.
    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn max_close(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.close)
            .fold(None, |acc, c| Some(acc.map_or(c, |m: f64| m.max(c))))
    }

    /// Change between the last two closes, if at least two points exist and
    /// the earlier close is non-zero.
    pub fn day_over_day_change(&self) -> Option<DayChange> {
        let [prev, last] = *self.points.last_chunk::<2>()?;
        if prev.close == 0.0 {
            return None;
        }
        let absolute = last.close - prev.close;
        Some(DayChange {
            absolute,
            percent: absolute / prev.close * 100.0,
        })
    }
}
