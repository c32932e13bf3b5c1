use thiserror::Error;

/// Typed failures of the chart core. Anything outside this taxonomy stays
/// `anyhow` at the app boundary.
#[derive(Debug, Clone, Error)]
pub enum ChartError {
    /// Malformed series input (length mismatch, non-increasing dates, empty).
    #[error("invalid series input: {0}")]
    InvalidInput(String),

    /// A window selector string that does not name a supported window.
    #[error("unsupported window selector: {0}")]
    UnsupportedWindow(String),

    /// Fetch failed and no cached entry could stand in.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),
}
