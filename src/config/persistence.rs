//! File persistence and serialization configuration

/// Directory path for storing cached price series
pub const SERIES_CACHE_PATH: &str = "series_data";

/// Base filename for series cache files (without extension)
pub const SERIES_FILENAME_WITHOUT_EXT: &str = "series";

/// Current version of the series cache serialization format
pub const SERIES_VERSION: f64 = 1.0;

/// Generate a per-symbol cache filename
/// Example: "series_bitcoin_v1.json"
pub fn series_cache_filename(symbol: &str) -> String {
    format!(
        "{}_{}_v{}.json",
        SERIES_FILENAME_WITHOUT_EXT, symbol, SERIES_VERSION
    )
}

// App state persistence
/// Path for saving/loading application UI state
pub const APP_STATE_PATH: &str = ".states.json";
