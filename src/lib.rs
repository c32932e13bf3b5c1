#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod chart;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod ui;
pub mod utils;

// The engine
pub mod engine;

// Re-export commonly used types
pub use chart::{AxisScale, PaneLayout, RenderContext};
pub use data::{
    CoinGeckoSource, FetchRange, FileStore, MarketDataCache, Provenance, SeriesOutcome,
    StalenessPolicy,
};
pub use domain::{PricePoint, PriceSeries, WindowSelector};
pub use engine::{ChartEngine, RenderPlan, RenderRequest};
pub use error::ChartError;
pub use ui::OutlookApp;

use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Refetch from the API even when the cached series is still fresh
    #[arg(long, default_value_t = false)]
    pub prefer_api: bool,

    /// CoinGecko coin id to chart
    #[arg(long, default_value_t = config::MARKET.fetch.coin_id.to_string())]
    pub coin: String,

    /// Quote currency for prices
    #[arg(long, default_value_t = config::MARKET.fetch.vs_currency.to_string())]
    pub vs_currency: String,

    /// Initial time window (1D, 1W, 1M, YTD, 5Y, 10Y, MAX); overrides the
    /// persisted choice
    #[arg(long)]
    pub window: Option<WindowSelector>,
}

/// Main application entry point - creates the GUI app
/// This is the public API for the binary to call
pub fn run_app(
    cc: &eframe::CreationContext<'_>,
    engine: Arc<ChartEngine>,
    runtime: Arc<Runtime>,
    args: &Cli,
    initial: Option<SeriesOutcome>,
) -> Box<dyn eframe::App> {
    let app = OutlookApp::new(
        cc,
        engine,
        runtime,
        args.coin.clone(),
        initial,
        args.window,
    );
    Box::new(app)
}
