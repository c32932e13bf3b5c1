use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::config::CHART;
use crate::error::ChartError;

/// The enumerated time windows the UI can ask for.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Default,
)]
pub enum WindowSelector {
    #[strum(to_string = "1D")]
    OneDay,
    #[strum(to_string = "1W")]
    OneWeek,
    #[strum(to_string = "1M")]
    OneMonth,
    #[strum(to_string = "YTD")]
    YearToDate,
    #[strum(to_string = "5Y")]
    FiveYears,
    #[default]
    #[strum(to_string = "10Y")]
    TenYears,
    #[strum(to_string = "MAX")]
    Max,
}

/// Upper bound of a window. `Open` means "through today", where today is
/// computed fresh at slice time rather than frozen here.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEnd {
    Open,
    /// Inclusive calendar date
    Date(NaiveDate),
}

/// Concrete date bounds resolved from a [`WindowSelector`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: WindowEnd,
}

impl WindowSelector {
    /// Resolve this selector into concrete bounds. All date math flows from
    /// the injected `reference_now` so tests stay deterministic.
    ///
    /// YearToDate is the previous full calendar year (see DESIGN.md); the
    /// current-year slice is handled separately by the engine, which routes it
    /// to the projection pane.
    pub fn resolve(self, reference_now: DateTime<Utc>) -> TimeWindow {
        let today = reference_now.date_naive();
        match self {
            WindowSelector::OneDay => TimeWindow {
                start: today - Days::new(1),
                end: WindowEnd::Open,
            },
            WindowSelector::OneWeek => TimeWindow {
                start: today - Days::new(7),
                end: WindowEnd::Open,
            },
            WindowSelector::OneMonth => TimeWindow {
                start: today - Months::new(1),
                end: WindowEnd::Open,
            },
            WindowSelector::YearToDate => {
                let previous_year = today.year() - 1;
                TimeWindow {
                    start: NaiveDate::from_ymd_opt(previous_year, 1, 1)
                        .expect("Jan 1 always exists"),
                    end: WindowEnd::Date(
                        NaiveDate::from_ymd_opt(previous_year, 12, 31)
                            .expect("Dec 31 always exists"),
                    ),
                }
            }
            WindowSelector::FiveYears => TimeWindow {
                start: today - Months::new(12 * 5),
                end: WindowEnd::Open,
            },
            WindowSelector::TenYears | WindowSelector::Max => TimeWindow {
                start: today - Months::new(12 * 10),
                end: WindowEnd::Open,
            },
        }
    }

    /// Whether this selector spans the widest supported range, which is what
    /// makes the layout reserve overflow bands.
    pub fn is_max_span(self) -> bool {
        matches!(self, WindowSelector::TenYears | WindowSelector::Max)
    }
}

impl TimeWindow {
    /// The future window projections are aligned against: today through the
    /// configured horizon.
    pub fn projection_horizon(today: NaiveDate) -> TimeWindow {
        TimeWindow {
            start: today,
            end: WindowEnd::Date(
                today + Months::new(12 * CHART.projection_horizon_years as u32),
            ),
        }
    }

    /// Concrete end bound, falling back to `today` for open windows.
    pub fn end_or(&self, today: NaiveDate) -> NaiveDate {
        match self.end {
            WindowEnd::Date(end) => end,
            WindowEnd::Open => today,
        }
    }
}

impl std::str::FromStr for WindowSelector {
    type Err = ChartError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.to_ascii_uppercase().as_str() {
            "1D" => Ok(WindowSelector::OneDay),
            "1W" => Ok(WindowSelector::OneWeek),
            "1M" => Ok(WindowSelector::OneMonth),
            "YTD" => Ok(WindowSelector::YearToDate),
            "5Y" => Ok(WindowSelector::FiveYears),
            "10Y" => Ok(WindowSelector::TenYears),
            "MAX" => Ok(WindowSelector::Max),
            other => Err(ChartError::UnsupportedWindow(other.to_string())),
        }
    }
}
