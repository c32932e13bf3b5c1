use crate::config::CHART;
use crate::domain::series::PriceSeries;

/// Price-axis domain and tick positions, shared verbatim by both panes so
/// magnitudes stay visually comparable.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisScale {
    pub domain_min: f64,
    pub domain_max: f64,
    pub tick_values: Vec<f64>,
}

impl AxisScale {
    /// Derive the shared scale from the windowed series and today's price.
    ///
    /// The axis top is the highest close plus 30% headroom, capped at three
    /// times today's price so a single historical spike cannot compress the
    /// visible range around the current price. The floor is always zero.
    pub fn compute(series: &PriceSeries, today_price: f64) -> AxisScale {
        let highest = series.max_close().unwrap_or(today_price);
        let candidate = highest * CHART.headroom_factor;
        let cap = today_price * CHART.today_cap_multiple;
        let domain_max = if candidate > cap { cap } else { candidate };

        AxisScale {
            domain_min: 0.0,
            domain_max,
            tick_values: tick_values(domain_max, CHART.tick_intervals),
        }
    }

    /// Fraction of the axis height a price sits at, clamped to [0, 1].
    /// The renderer turns this into pixel Y inside a pane.
    pub fn position_of(&self, price: f64) -> f64 {
        if self.domain_max <= self.domain_min {
            return 0.0;
        }
        ((price - self.domain_min) / (self.domain_max - self.domain_min)).clamp(0.0, 1.0)
    }
}

/// Evenly spaced tick values: `intervals` gaps, `intervals + 1` labels,
/// starting at zero.
fn tick_values(domain_max: f64, intervals: usize) -> Vec<f64> {
    let tick_interval = domain_max / intervals as f64;
    (0..=intervals).map(|i| i as f64 * tick_interval).collect()
}

/// Axis label in thousands with a currency prefix: `$0K`, `$12.3K`.
pub fn format_thousands(value: f64) -> String {
    if value == 0.0 {
        return "$0K".to_string();
    }
    format!("${:.1}K", value / 1000.0)
}
