//! Configuration module for the market-outlook application.

pub mod chart;
pub mod market;
pub mod persistence;

// Re-export commonly used items
pub use chart::CHART;
pub use market::MARKET;
pub use persistence::{APP_STATE_PATH, SERIES_CACHE_PATH, SERIES_VERSION, series_cache_filename};
