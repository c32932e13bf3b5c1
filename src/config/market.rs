//! Market-data configuration constants and types.

/// Configuration for the CoinGecko REST client
pub struct ApiConfig {
    /// REST base URL for the market-chart endpoint
    pub base_url: &'static str,
    pub timeout_ms: u64,
}

/// Defaults for what we ask the data source for
pub struct FetchDefaults {
    /// Coin identifier as the API knows it
    pub coin_id: &'static str,
    /// Quote currency for prices
    pub vs_currency: &'static str,
    /// Span of history fetched and cached (the "max" supported window)
    pub max_span_days: u32,
}

/// Cache freshness knobs. The policy itself is an explicit enum on the cache;
/// these are the numbers it is built from.
pub struct FreshnessDefaults {
    /// Maximum age of a cached series before a refetch (seconds)
    pub acceptable_age_sec: i64,
    /// Serve the previous cached series when a refetch fails
    pub serve_stale_on_error: bool,
}

/// The master market-data configuration struct
pub struct MarketConfig {
    pub api: ApiConfig,
    pub fetch: FetchDefaults,
    pub freshness: FreshnessDefaults,
}

pub const MARKET: MarketConfig = MarketConfig {
    api: ApiConfig {
        base_url: "https://api.coingecko.com/api/v3",
        timeout_ms: 10_000,
    },
    fetch: FetchDefaults {
        coin_id: "bitcoin",
        vs_currency: "usd",
        // 10 years of dailies, same span as the widest window
        max_span_days: 3650,
    },
    freshness: FreshnessDefaults {
        // 24 hours (60 * 60 * 24)
        acceptable_age_sec: 86_400,
        serve_stale_on_error: true,
    },
};
