use std::sync::Arc;

use chrono::Utc;
use eframe::{Frame, egui};
use poll_promise::Promise;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tokio::runtime::Runtime;

use crate::chart::layout::RenderContext;
use crate::config::MARKET;
use crate::data::cache::{Provenance, SeriesOutcome};
use crate::data::source::FetchRange;
use crate::domain::series::PriceSeries;
use crate::domain::window::WindowSelector;
use crate::engine::{ChartEngine, RenderRequest};
use crate::error::ChartError;

/// The slice of UI state worth persisting between runs.
#[derive(Serialize, Deserialize, Clone, Copy, Default)]
struct UiState {
    selector: WindowSelector,
    context: RenderContext,
}

/// A finished background fetch, stamped so superseded results get dropped.
struct FetchOutcome {
    stamp: u64,
    result: Result<SeriesOutcome, ChartError>,
}

pub struct OutlookApp {
    engine: Arc<ChartEngine>,
    runtime: Arc<Runtime>,
    symbol: String,
    state: UiState,
    series: Option<PriceSeries>,
    provenance: Provenance,
    last_error: Option<ChartError>,
    fetch_promise: Option<Promise<FetchOutcome>>,
}

impl OutlookApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        engine: Arc<ChartEngine>,
        runtime: Arc<Runtime>,
        symbol: String,
        initial: Option<SeriesOutcome>,
        window_override: Option<WindowSelector>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut state: UiState = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        if let Some(selector) = window_override {
            state.selector = selector;
        }

        let (series, provenance, last_error) = match initial {
            Some(outcome) => (Some(outcome.series), outcome.provenance, None),
            None => (
                None,
                Provenance::Cache,
                Some(ChartError::DataUnavailable(
                    "no market data loaded yet".to_string(),
                )),
            ),
        };

        Self {
            engine,
            runtime,
            symbol,
            state,
            series,
            provenance,
            last_error,
            fetch_promise: None,
        }
    }

    fn start_refresh(&mut self) {
        if self.fetch_promise.is_some() {
            return;
        }
        let stamp = self.engine.begin_request();
        let engine = Arc::clone(&self.engine);
        let runtime = Arc::clone(&self.runtime);
        let symbol = self.symbol.clone();

        self.fetch_promise = Some(Promise::spawn_thread("market_fetch", move || {
            let result = runtime.block_on(engine.load_series(
                &symbol,
                FetchRange::Days(MARKET.fetch.max_span_days),
                Utc::now(),
            ));
            FetchOutcome { stamp, result }
        }));
    }

    fn poll_fetch(&mut self) {
        let done = self
            .fetch_promise
            .as_ref()
            .is_some_and(|promise| promise.ready().is_some());
        if !done {
            return;
        }
        let promise = self.fetch_promise.take().expect("checked above");
        let outcome = match promise.try_take() {
            Ok(outcome) => outcome,
            Err(promise) => {
                self.fetch_promise = Some(promise);
                return;
            }
        };

        if !self.engine.is_current(outcome.stamp) {
            log::debug!("Dropping superseded fetch result (stamp {})", outcome.stamp);
            return;
        }
        match outcome.result {
            Ok(SeriesOutcome { series, provenance }) => {
                self.series = Some(series);
                self.provenance = provenance;
                self.last_error = None;
            }
            Err(e) => {
                log::error!("Market data refresh failed: {}", e);
                self.last_error = Some(e);
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(self.symbol.to_uppercase());

            if let Some(series) = &self.series {
                if let Some(latest) = series.latest() {
                    ui.label(
                        egui::RichText::new(format!("${:.2}", latest.close))
                            .strong()
                            .size(16.0),
                    );
                }
                if let Some(change) = series.day_over_day_change() {
                    let color = if change.absolute >= 0.0 {
                        egui::Color32::from_rgb(0x24, 0xC6, 0xC8)
                    } else {
                        egui::Color32::from_rgb(0xED, 0x56, 0x66)
                    };
                    ui.colored_label(
                        color,
                        format!("{:+.2} ({:+.2}%)", change.absolute, change.percent),
                    );
                }
            }

            ui.separator();
            for selector in WindowSelector::iter() {
                ui.selectable_value(&mut self.state.selector, selector, selector.to_string());
            }

            ui.separator();
            for context in RenderContext::iter() {
                ui.selectable_value(&mut self.state.context, context, context.to_string());
            }

            ui.separator();
            let refreshing = self.fetch_promise.is_some();
            if ui
                .add_enabled(!refreshing, egui::Button::new("⟳ Refresh"))
                .clicked()
            {
                self.start_refresh();
            }
            if refreshing {
                ui.spinner();
            }

            match self.provenance {
                Provenance::StaleFallback => {
                    ui.colored_label(egui::Color32::YELLOW, "⚠ stale data (source unreachable)");
                }
                Provenance::Cache => {
                    ui.weak("cached");
                }
                Provenance::Network => {
                    ui.weak("live");
                }
            }
        });
    }

    fn chart(&mut self, ui: &mut egui::Ui) {
        let Some(series) = &self.series else {
            ui.centered_and_justified(|ui| {
                ui.label("No market data. Hit Refresh to fetch.");
            });
            return;
        };

        let size = ui.available_size();
        let request = RenderRequest {
            selector: self.state.selector,
            context: self.state.context,
            container_width: size.x,
            container_height: size.y,
            reference_now: Utc::now(),
        };

        match self.engine.build_render_plan(series, self.provenance, &request) {
            Ok(plan) => crate::ui::panes::draw(ui, &plan),
            Err(e) => {
                ui.colored_label(egui::Color32::RED, format!("Render failed: {}", e));
            }
        }
    }
}

impl eframe::App for OutlookApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.state);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_fetch();
        if self.fetch_promise.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(e) = &self.last_error {
                ui.colored_label(egui::Color32::RED, format!("⚠ {}", e));
            }
            self.chart(ui);
        });
    }
}
