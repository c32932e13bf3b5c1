//! X-axis tick positions and per-window label formats.

use chrono::NaiveDate;

use crate::domain::window::WindowSelector;

/// Evenly spaced tick dates across `[start, end]`, both endpoints included.
/// `omit_first` drops the start tick (used when it would collide with the
/// pane edge label).
pub fn calculate_x_ticks(
    start: NaiveDate,
    end: NaiveDate,
    num_ticks: usize,
    omit_first: bool,
) -> Vec<NaiveDate> {
    if num_ticks < 2 || end <= start {
        return vec![start];
    }
    let span_days = (end - start).num_days();
    let interval = span_days as f64 / (num_ticks - 1) as f64;

    let first = if omit_first { 1 } else { 0 };
    (first..num_ticks)
        .map(|i| start + chrono::Days::new((interval * i as f64).round() as u64))
        .collect()
}

/// chrono format string for tick labels under a given window. Ticks are
/// calendar dates, so even the shortest window gets a date-only format.
pub fn tick_format_for(selector: WindowSelector) -> &'static str {
    match selector {
        WindowSelector::OneDay | WindowSelector::OneWeek => "%a-%d",
        WindowSelector::OneMonth => "%d-%b",
        WindowSelector::YearToDate => "%b-%y",
        WindowSelector::FiveYears | WindowSelector::TenYears | WindowSelector::Max => "%Y",
    }
}

pub fn format_tick(date: NaiveDate, selector: WindowSelector) -> String {
    date.format(tick_format_for(selector)).to_string()
}
