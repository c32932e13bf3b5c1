use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::MARKET;
use crate::utils::time_utils::{TimeUtils, epoch_ms_to_date, parse_iso_date};

/// How much history to ask the source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    Days(u32),
    /// Everything the source has
    Max,
}

/// Raw `{dates, prices}` payload as the wire gives it to us: ISO-8601
/// calendar dates, ascending, possibly with gaps and intra-day duplicates.
#[derive(Debug, Clone, Default)]
pub struct RawMarketData {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

impl RawMarketData {
    /// Collapse to one close per calendar day, keeping the last observation
    /// of each day. Recent spans can come back at sub-daily resolution, and
    /// the normalizer requires strictly increasing dates.
    pub fn daily_closes(&self) -> (Vec<NaiveDate>, Vec<f64>) {
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut prices: Vec<f64> = Vec::new();
        for (text, price) in self.dates.iter().zip(&self.prices) {
            let Some(date) = parse_iso_date(text) else {
                log::warn!("Dropping unparseable date from source payload: {}", text);
                continue;
            };
            if dates.last() == Some(&date) {
                *prices.last_mut().expect("prices tracks dates") = *price;
            } else {
                dates.push(date);
                prices.push(*price);
            }
        }
        (dates, prices)
    }
}

/// One way of obtaining a raw price series.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    // Either fetch the raw series OR return an anyhow::error
    async fn fetch(&self, symbol: &str, range: FetchRange) -> Result<RawMarketData>;

    /// A unique identifier for this implementation (so that afterwards we know which one we used).
    fn signature(&self) -> &'static str;
}

/// CoinGecko `market_chart` endpoint client.
pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
    vs_currency: String,
}

#[derive(Deserialize)]
struct MarketChartResponse {
    /// `[epoch_ms, price]` pairs, ascending
    prices: Vec<(i64, f64)>,
}

impl CoinGeckoSource {
    pub fn new(vs_currency: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(MARKET.api.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: MARKET.api.base_url.to_string(),
            vs_currency: vs_currency.to_string(),
        })
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoSource {
    fn signature(&self) -> &'static str {
        "CoinGecko API"
    }

    async fn fetch(&self, symbol: &str, range: FetchRange) -> Result<RawMarketData> {
        let days = match range {
            FetchRange::Days(n) => n.to_string(),
            FetchRange::Max => "max".to_string(),
        };
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url, symbol, self.vs_currency, days
        );

        log::info!("Fetching market data: {} ({} days)", symbol, days);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Market data request failed")?
            .error_for_status()
            .context("Market data request rejected")?;

        let body: MarketChartResponse = response
            .json()
            .await
            .context("Failed to parse market chart response")?;

        let mut dates = Vec::with_capacity(body.prices.len());
        let mut prices = Vec::with_capacity(body.prices.len());
        for (epoch_ms, price) in body.prices {
            let Some(date) = epoch_ms_to_date(epoch_ms) else {
                log::warn!("Dropping out-of-range timestamp {} from response", epoch_ms);
                continue;
            };
            dates.push(date.format(TimeUtils::STANDARD_TIME_FORMAT).to_string());
            prices.push(price);
        }
        Ok(RawMarketData { dates, prices })
    }
}
