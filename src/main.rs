#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eframe::NativeOptions;
use tokio::runtime::Runtime;

use market_outlook::config::{APP_STATE_PATH, MARKET, SERIES_CACHE_PATH};
use market_outlook::data::projections::DummyProjectionSource;
use market_outlook::{
    ChartEngine, Cli, CoinGeckoSource, FetchRange, FileStore, MarketDataCache, StalenessPolicy,
    run_app,
};

fn main() -> eframe::Result {
    // A. Init Logging
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {:?}", panic_info);
    }));
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    // C. Wire the data layer
    let source = match CoinGeckoSource::new(&args.vs_currency) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            log::error!("Failed to build market data source: {:#}", e);
            std::process::exit(1);
        }
    };
    let policy = if args.prefer_api {
        StalenessPolicy::AlwaysStale
    } else {
        StalenessPolicy::MaxAgeSecs(MARKET.freshness.acceptable_age_sec)
    };
    let cache = Arc::new(MarketDataCache::new(
        source,
        Arc::new(FileStore::new(SERIES_CACHE_PATH)),
        policy,
        MARKET.freshness.serve_stale_on_error,
    ));
    let engine = Arc::new(ChartEngine::new(
        cache,
        Arc::new(DummyProjectionSource::default()),
    ));

    // D. Initial Data Load (Blocking)
    let rt = Arc::new(Runtime::new().expect("Failed to create Tokio runtime"));
    let initial = rt
        .block_on(engine.load_series(
            &args.coin,
            FetchRange::Days(MARKET.fetch.max_span_days),
            chrono::Utc::now(),
        ))
        .map_err(|e| {
            log::warn!("Initial load failed, starting without data: {}", e);
            e
        })
        .ok();

    // E. Run Native App
    let options = NativeOptions {
        persistence_path: Some(PathBuf::from(APP_STATE_PATH)),
        ..Default::default()
    };

    let app_engine = Arc::clone(&engine);
    let app_rt = Arc::clone(&rt);
    eframe::run_native(
        "Market Outlook",
        options,
        Box::new(move |cc| Ok(run_app(cc, app_engine, app_rt, &args, initial))),
    )
}
