//! Orchestration between the data layer and the chart math: resolves the
//! requested window, slices the series, computes the shared scale and pane
//! layout, and classifies projections into one immutable [`RenderPlan`] the
//! renderer can draw without further decisions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::chart::layout::{PaneLayout, RenderContext};
use crate::chart::scale::AxisScale;
use crate::chart::ticks::calculate_x_ticks;
use crate::config::CHART;
use crate::data::cache::{MarketDataCache, Provenance, SeriesOutcome};
use crate::data::projections::ProjectionSource;
use crate::data::source::FetchRange;
use crate::domain::projection::{ClassifiedProjection, classify_projections};
use crate::domain::series::{DayChange, PriceSeries};
use crate::domain::window::{TimeWindow, WindowEnd, WindowSelector};
use crate::error::ChartError;

/// Tick count for the historical x axis; the projection pane derives its own
/// ticks from the classified records.
const HISTORICAL_X_TICKS: usize = 6;

/// One render request as the UI poses it.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest {
    pub selector: WindowSelector,
    pub context: RenderContext,
    pub container_width: f32,
    pub container_height: f32,
    pub reference_now: DateTime<Utc>,
}

/// Everything the renderer needs for one frame, computed up front.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub context: RenderContext,
    pub selector: WindowSelector,
    pub window: TimeWindow,
    pub today: NaiveDate,
    pub today_price: f64,
    pub day_change: Option<DayChange>,
    /// Shared price axis across both panes
    pub scale: AxisScale,
    pub layout: PaneLayout,
    pub historical: PriceSeries,
    /// Actuals routed to the projection pane (YTD only: the current year so
    /// far, drawn right of the divider against the same scale)
    pub projection_actuals: PriceSeries,
    pub projections: Vec<ClassifiedProjection>,
    pub x_ticks: Vec<NaiveDate>,
    pub provenance: Provenance,
}

/// Ties the cache, the projection supplier, and a request-generation counter
/// together. The counter lets the UI discard fetch results that a newer
/// request has superseded.
pub struct ChartEngine {
    cache: Arc<MarketDataCache>,
    projections: Arc<dyn ProjectionSource>,
    generation: AtomicU64,
}

impl ChartEngine {
    pub fn new(cache: Arc<MarketDataCache>, projections: Arc<dyn ProjectionSource>) -> Self {
        Self {
            cache,
            projections,
            generation: AtomicU64::new(0),
        }
    }

    /// Stamp a new request; any earlier stamp stops being current.
    pub fn begin_request(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, stamp: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == stamp
    }

    pub async fn load_series(
        &self,
        symbol: &str,
        range: FetchRange,
        reference_now: DateTime<Utc>,
    ) -> Result<SeriesOutcome, ChartError> {
        self.cache.get_series(symbol, range, reference_now).await
    }

    /// Turn a loaded series into a frame-ready plan. Pure with respect to the
    /// injected `reference_now`, so tests pin the clock.
    pub fn build_render_plan(
        &self,
        series: &PriceSeries,
        provenance: Provenance,
        request: &RenderRequest,
    ) -> Result<RenderPlan, ChartError> {
        let today = request.reference_now.date_naive();
        let window = request.selector.resolve(request.reference_now);

        let latest = series.latest().ok_or_else(|| {
            ChartError::DataUnavailable("price series is empty".to_string())
        })?;
        let today_price = latest.close;

        let historical = series.slice(&window, today);

        // YTD shows last year left of the divider and the current year so far
        // right of it; the scale must cover both so the line is continuous.
        let (projection_actuals, scale_basis) = if request.selector == WindowSelector::YearToDate {
            let current_year = TimeWindow {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1).expect("Jan 1 always exists"),
                end: WindowEnd::Open,
            };
            let combined = TimeWindow {
                start: window.start,
                end: WindowEnd::Open,
            };
            (series.slice(&current_year, today), series.slice(&combined, today))
        } else {
            (PriceSeries::default(), historical.clone())
        };

        let scale = AxisScale::compute(&scale_basis, today_price);

        let reserve_overflow =
            request.selector.is_max_span() && request.context != RenderContext::HistoricalOnly;
        let layout = PaneLayout::compute(
            request.container_width,
            request.container_height,
            CHART.margins,
            request.context,
            reserve_overflow,
        );

        let projections = if request.context == RenderContext::HistoricalOnly {
            Vec::new()
        } else {
            let horizon = TimeWindow::projection_horizon(today);
            let records = self.projections.projections(today, today_price);
            classify_projections(&records, &scale, &horizon, today)
        };

        let x_ticks = calculate_x_ticks(
            window.start,
            window.end_or(today),
            HISTORICAL_X_TICKS,
            false,
        );

        Ok(RenderPlan {
            context: request.context,
            selector: request.selector,
            window,
            today,
            today_price,
            day_change: series.day_over_day_change(),
            scale,
            layout,
            historical,
            projection_actuals,
            projections,
            x_ticks,
            provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MARKET;
    use crate::data::cache::StalenessPolicy;
    use crate::data::projections::DummyProjectionSource;
    use crate::data::source::{MarketDataSource, RawMarketData};
    use crate::data::store::MemoryStore;
    use crate::domain::projection::{ProjectionRecord, ProjectionTag};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct NoFetchSource;

    #[async_trait]
    impl MarketDataSource for NoFetchSource {
        fn signature(&self) -> &'static str {
            "NoFetch"
        }

        async fn fetch(&self, _: &str, _: FetchRange) -> anyhow::Result<RawMarketData> {
            anyhow::bail!("not used in these tests")
        }
    }

    struct FixedProjections(Vec<ProjectionRecord>);

    impl ProjectionSource for FixedProjections {
        fn projections(&self, _: NaiveDate, _: f64) -> Vec<ProjectionRecord> {
            self.0.clone()
        }
    }

    fn d(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    fn engine_with(projections: Arc<dyn ProjectionSource>) -> ChartEngine {
        let cache = Arc::new(MarketDataCache::new(
            Arc::new(NoFetchSource),
            Arc::new(MemoryStore::new()),
            StalenessPolicy::MaxAgeSecs(MARKET.freshness.acceptable_age_sec),
            MARKET.freshness.serve_stale_on_error,
        ));
        ChartEngine::new(cache, projections)
    }

    fn two_year_series() -> PriceSeries {
        PriceSeries::normalize(
            &[d("2023-01-01"), d("2023-12-31"), d("2024-07-15")],
            &[100.0, 200.0, 300.0],
        )
        .unwrap()
    }

    fn request(selector: WindowSelector, context: RenderContext) -> RenderRequest {
        RenderRequest {
            selector,
            context,
            container_width: 1200.0,
            container_height: 600.0,
            reference_now: Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_ytd_routes_current_year_to_projection_pane() {
        let engine = engine_with(Arc::new(FixedProjections(vec![])));
        let plan = engine
            .build_render_plan(
                &two_year_series(),
                Provenance::Cache,
                &request(WindowSelector::YearToDate, RenderContext::Hybrid),
            )
            .unwrap();

        // Left pane: previous calendar year only
        assert_eq!(plan.historical.points()[0].date, d("2023-01-01"));
        assert_eq!(plan.historical.latest().unwrap().date, d("2023-12-31"));
        // Right pane actuals: Jan 1 of this year through today
        assert_eq!(plan.projection_actuals.points()[0].date, d("2024-01-01"));
        assert_eq!(plan.projection_actuals.latest().unwrap().date, d("2024-07-15"));
        // Scale covers both slices
        assert!(plan.scale.domain_max >= 300.0);
    }

    #[test]
    fn test_historical_only_skips_projections() {
        let records = vec![
            ProjectionRecord::new(d("2025-01-01"), d("2025-02-01"), 100.0, 200.0).unwrap(),
        ];
        let engine = engine_with(Arc::new(FixedProjections(records)));

        let plan = engine
            .build_render_plan(
                &two_year_series(),
                Provenance::Cache,
                &request(WindowSelector::TenYears, RenderContext::HistoricalOnly),
            )
            .unwrap();
        assert!(plan.projections.is_empty());
        assert!(plan.layout.projection.is_none());
    }

    #[test]
    fn test_overflow_reserved_for_max_span_hybrid_only() {
        let engine = engine_with(Arc::new(DummyProjectionSource::default()));
        let series = two_year_series();

        let plan = engine
            .build_render_plan(
                &series,
                Provenance::Network,
                &request(WindowSelector::TenYears, RenderContext::Hybrid),
            )
            .unwrap();
        assert_eq!(plan.layout.projection.unwrap().overflow_width, CHART.overflow_band_px);

        let plan = engine
            .build_render_plan(
                &series,
                Provenance::Network,
                &request(WindowSelector::OneMonth, RenderContext::Hybrid),
            )
            .unwrap();
        assert_eq!(plan.layout.projection.unwrap().overflow_width, 0.0);
    }

    #[test]
    fn test_projections_classified_against_horizon() {
        // One record inside the ten-year horizon, one past it
        let records = vec![
            ProjectionRecord::new(d("2025-01-01"), d("2025-02-01"), 100.0, 200.0).unwrap(),
            ProjectionRecord::new(d("2040-01-01"), d("2040-02-01"), 100.0, 200.0).unwrap(),
        ];
        let engine = engine_with(Arc::new(FixedProjections(records)));

        let plan = engine
            .build_render_plan(
                &two_year_series(),
                Provenance::Cache,
                &request(WindowSelector::TenYears, RenderContext::Hybrid),
            )
            .unwrap();
        assert_eq!(plan.projections.len(), 2);
        assert_eq!(plan.projections[0].tag, ProjectionTag::InRange);
        assert_eq!(plan.projections[1].tag, ProjectionTag::BeyondWindowOverflow);
    }

    #[test]
    fn test_empty_series_is_unavailable() {
        let engine = engine_with(Arc::new(FixedProjections(vec![])));
        let err = engine
            .build_render_plan(
                &PriceSeries::default(),
                Provenance::Cache,
                &request(WindowSelector::OneWeek, RenderContext::Hybrid),
            )
            .unwrap_err();
        assert!(matches!(err, ChartError::DataUnavailable(_)));
    }

    #[test]
    fn test_generation_stamps_supersede() {
        let engine = engine_with(Arc::new(FixedProjections(vec![])));
        let first = engine.begin_request();
        assert!(engine.is_current(first));
        let second = engine.begin_request();
        assert!(!engine.is_current(first));
        assert!(engine.is_current(second));
    }

    #[test]
    fn test_x_ticks_span_the_window() {
        let engine = engine_with(Arc::new(FixedProjections(vec![])));
        let plan = engine
            .build_render_plan(
                &two_year_series(),
                Provenance::Cache,
                &request(WindowSelector::OneMonth, RenderContext::Hybrid),
            )
            .unwrap();
        assert_eq!(plan.x_ticks.len(), HISTORICAL_X_TICKS);
        assert_eq!(plan.x_ticks[0], plan.window.start);
        assert_eq!(*plan.x_ticks.last().unwrap(), d("2024-07-15"));
    }
}
