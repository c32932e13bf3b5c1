use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::scale::AxisScale;
use crate::domain::window::TimeWindow;
use crate::error::ChartError;

/// A future value-range estimate supplied by a projection source.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ProjectionRecord {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_value: f64,
    pub max_value: f64,
}

/// Where a record's price range sits relative to a reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Above,
    Below,
    Straddles,
}

/// How a record relates to the shared axis domain and the projection window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionTag {
    InRange,
    /// Entire value range above the axis top
    AboveAxisOverflow,
    /// Starts after the projection window ends
    BeyondWindowOverflow,
    BothOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedProjection {
    pub record: ProjectionRecord,
    pub tag: ProjectionTag,
    /// Degenerate single-day, single-value record; drawn as a marker
    pub is_point: bool,
}

impl ProjectionRecord {
    /// Validating constructor; rejects inverted ranges and non-finite values.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        min_value: f64,
        max_value: f64,
    ) -> Result<Self, ChartError> {
        let record = Self {
            start_date,
            end_date,
            min_value,
            max_value,
        };
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<(), ChartError> {
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            return Err(ChartError::InvalidInput(
                "projection values must be finite".to_string(),
            ));
        }
        if self.min_value > self.max_value {
            return Err(ChartError::InvalidInput(format!(
                "projection min {} above max {}",
                self.min_value, self.max_value
            )));
        }
        if self.start_date > self.end_date {
            return Err(ChartError::InvalidInput(format!(
                "projection starts {} after it ends {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    pub fn is_point(&self) -> bool {
        self.min_value == self.max_value && self.start_date == self.end_date
    }

    /// Used by the renderer to split ranges into bullish/bearish segments
    /// around today's price.
    pub fn relation_to(&self, price: f64) -> Relation {
        if self.min_value > price {
            Relation::Above
        } else if self.max_value < price {
            Relation::Below
        } else {
            Relation::Straddles
        }
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    pub fn overlaps(&self, period_start: NaiveDate, period_end: NaiveDate) -> bool {
        self.start_date <= period_end && self.end_date >= period_start
    }
}

/// Pure selection helpers over projection slices. The renderer uses the
/// price relations for bullish/bearish coloring; the rest are library
/// surface for consumers querying a forecast set.
pub mod filters {
    use super::*;

    /// Records entirely above `price`.
    pub fn above_price(records: &[ProjectionRecord], price: f64) -> Vec<ProjectionRecord> {
        records
            .iter()
            .filter(|r| r.relation_to(price) == Relation::Above)
            .copied()
            .collect()
    }

    /// Records entirely below `price`.
    pub fn below_price(records: &[ProjectionRecord], price: f64) -> Vec<ProjectionRecord> {
        records
            .iter()
            .filter(|r| r.relation_to(price) == Relation::Below)
            .copied()
            .collect()
    }

    /// Records whose date span touches `[period_start, period_end]`.
    pub fn overlapping_period(
        records: &[ProjectionRecord],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Vec<ProjectionRecord> {
        records
            .iter()
            .filter(|r| r.overlaps(period_start, period_end))
            .copied()
            .collect()
    }

    /// Records spanning at least `days` calendar days.
    pub fn longer_than(records: &[ProjectionRecord], days: i64) -> Vec<ProjectionRecord> {
        records
            .iter()
            .filter(|r| r.duration_days() >= days)
            .copied()
            .collect()
    }

    /// Records whose whole value range fits inside `[low, high]`.
    pub fn within_values(
        records: &[ProjectionRecord],
        low: f64,
        high: f64,
    ) -> Vec<ProjectionRecord> {
        records
            .iter()
            .filter(|r| r.min_value >= low && r.max_value <= high)
            .copied()
            .collect()
    }
}

/// Sort records chronologically (stable, so equal start dates keep input
/// order) and tag each against the shared axis scale and the projection
/// window. Malformed records are logged and skipped rather than failing the
/// whole render; projection data is best-effort.
pub fn classify_projections(
    records: &[ProjectionRecord],
    scale: &AxisScale,
    window: &TimeWindow,
    today: NaiveDate,
) -> Vec<ClassifiedProjection> {
    let mut sorted: Vec<ProjectionRecord> = records.to_vec();
    sorted.sort_by_key(|r| r.start_date);

    let window_end = window.end_or(today);

    sorted
        .into_iter()
        .filter_map(|record| {
            if let Err(e) = record.validate() {
                log::warn!("Skipping malformed projection record: {}", e);
                return None;
            }

            let above_axis = record.min_value > scale.domain_max;
            let beyond_window = record.start_date > window_end;
            let tag = match (above_axis, beyond_window) {
                (false, false) => ProjectionTag::InRange,
                (true, false) => ProjectionTag::AboveAxisOverflow,
                (false, true) => ProjectionTag::BeyondWindowOverflow,
                (true, true) => ProjectionTag::BothOverflow,
            };

            Some(ClassifiedProjection {
                record,
                tag,
                is_point: record.is_point(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::WindowEnd;

    fn d(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    fn record(start: &str, end: &str, min: f64, max: f64) -> ProjectionRecord {
        ProjectionRecord {
            start_date: d(start),
            end_date: d(end),
            min_value: min,
            max_value: max,
        }
    }

    fn scale_to(domain_max: f64) -> AxisScale {
        AxisScale {
            domain_min: 0.0,
            domain_max,
            tick_values: vec![],
        }
    }

    fn horizon(start: &str, end: &str) -> TimeWindow {
        TimeWindow {
            start: d(start),
            end: WindowEnd::Date(d(end)),
        }
    }

    #[test]
    fn test_classification_matrix() {
        let scale = scale_to(100.0);
        let window = horizon("2024-01-01", "2034-01-01");
        let today = d("2024-01-01");

        let records = [
            record("2025-01-01", "2025-06-30", 40.0, 80.0), // in range
            record("2025-01-01", "2025-06-30", 150.0, 200.0), // above axis
            record("2035-01-01", "2035-06-30", 40.0, 80.0), // beyond window
            record("2035-01-01", "2035-06-30", 150.0, 200.0), // both
        ];

        let classified = classify_projections(&records, &scale, &window, today);
        assert_eq!(classified.len(), 4);
        assert_eq!(classified[0].tag, ProjectionTag::InRange);
        assert_eq!(classified[1].tag, ProjectionTag::AboveAxisOverflow);
        assert_eq!(classified[2].tag, ProjectionTag::BeyondWindowOverflow);
        assert_eq!(classified[3].tag, ProjectionTag::BothOverflow);
    }

    #[test]
    fn test_sorted_by_start_date() {
        let scale = scale_to(100.0);
        let window = horizon("2024-01-01", "2034-01-01");

        let records = [
            record("2026-01-01", "2026-02-01", 1.0, 2.0),
            record("2025-01-01", "2025-02-01", 3.0, 4.0),
        ];
        let classified = classify_projections(&records, &scale, &window, d("2024-01-01"));
        assert_eq!(classified[0].record.start_date, d("2025-01-01"));
        assert_eq!(classified[1].record.start_date, d("2026-01-01"));
    }

    #[test]
    fn test_point_projection() {
        let scale = scale_to(100.0);
        let window = horizon("2024-01-01", "2034-01-01");
        let records = [record("2025-03-01", "2025-03-01", 55.0, 55.0)];

        let classified = classify_projections(&records, &scale, &window, d("2024-01-01"));
        assert!(classified[0].is_point);
        assert_eq!(classified[0].tag, ProjectionTag::InRange);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let scale = scale_to(100.0);
        let window = horizon("2024-01-01", "2034-01-01");

        let records = [
            record("2025-01-01", "2025-02-01", 80.0, 20.0), // min > max
            record("2025-06-01", "2025-01-01", 1.0, 2.0),   // start > end
            record("2025-01-01", "2025-02-01", f64::NAN, 2.0),
            record("2025-01-01", "2025-02-01", 1.0, 2.0), // the one survivor
        ];
        let classified = classify_projections(&records, &scale, &window, d("2024-01-01"));
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].record.min_value, 1.0);
    }

    #[test]
    fn test_validating_constructor() {
        assert!(ProjectionRecord::new(d("2025-01-01"), d("2025-02-01"), 1.0, 2.0).is_ok());
        assert!(ProjectionRecord::new(d("2025-01-01"), d("2025-02-01"), 2.0, 1.0).is_err());
        assert!(ProjectionRecord::new(d("2025-02-01"), d("2025-01-01"), 1.0, 2.0).is_err());
    }

    #[test]
    fn test_relation_to_price() {
        let r = record("2025-01-01", "2025-02-01", 40.0, 80.0);
        assert_eq!(r.relation_to(30.0), Relation::Above);
        assert_eq!(r.relation_to(90.0), Relation::Below);
        assert_eq!(r.relation_to(60.0), Relation::Straddles);
    }

    #[test]
    fn test_price_filters() {
        let records = [
            record("2025-01-01", "2025-02-01", 40.0, 80.0),
            record("2025-03-01", "2025-04-01", 110.0, 150.0),
            record("2025-05-01", "2025-06-01", 10.0, 20.0),
        ];
        assert_eq!(filters::above_price(&records, 100.0).len(), 1);
        assert_eq!(filters::below_price(&records, 100.0).len(), 2);
        // Straddling records appear in neither
        assert_eq!(filters::above_price(&records, 50.0).len(), 1);
        assert_eq!(filters::below_price(&records, 50.0).len(), 1);
        assert_eq!(filters::within_values(&records, 0.0, 100.0).len(), 2);
    }

    #[test]
    fn test_date_filters() {
        let records = [
            record("2025-01-01", "2025-02-01", 1.0, 2.0),
            record("2025-03-01", "2025-03-02", 1.0, 2.0),
        ];
        let hits = filters::overlapping_period(&records, d("2025-01-15"), d("2025-02-15"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start_date, d("2025-01-01"));

        assert_eq!(filters::longer_than(&records, 7).len(), 1);
        assert_eq!(filters::longer_than(&records, 1).len(), 2);
    }
}
