use chrono::{Months, NaiveDate};
use rand::Rng;

use crate::config::CHART;
use crate::domain::projection::ProjectionRecord;

/// Supplier of future-value ranges for the projection pane. Implementations
/// return records relative to `today`; ordering and validation happen later
/// in classification.
pub trait ProjectionSource: Send + Sync {
    fn projections(&self, today: NaiveDate, today_price: f64) -> Vec<ProjectionRecord>;
}

/// Placeholder supplier: one random range per month across the projection
/// horizon, anchored around today's price. Stands in until a real forecast
/// feed exists.
pub struct DummyProjectionSource {
    /// Upper bound the random ceilings are pulled towards
    pub price_ceiling: f64,
}

impl Default for DummyProjectionSource {
    fn default() -> Self {
        Self {
            price_ceiling: 87_900.0,
        }
    }
}

impl ProjectionSource for DummyProjectionSource {
    fn projections(&self, today: NaiveDate, today_price: f64) -> Vec<ProjectionRecord> {
        let mut rng = rand::thread_rng();
        let months = (CHART.projection_horizon_years * 12) as u32;
        let mut records = Vec::with_capacity(months as usize);

        for i in 1..=months {
            let start = today + Months::new(i);
            let end = start + Months::new(1);
            let max_value =
                today_price + rng.gen_range(0.0..1.0) * (self.price_ceiling - today_price).max(0.0);
            let min_value = rng.gen_range(0.0..1.0) * max_value;
            match ProjectionRecord::new(start, end, min_value, max_value) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping generated projection: {}", e),
            }
        }
        records.sort_by_key(|r| r.start_date);
        records
    }
}
