use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::SERIES_VERSION;
use crate::data::source::{FetchRange, MarketDataSource, RawMarketData};
use crate::data::store::CacheStore;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::error::ChartError;
use crate::utils::time_utils::{TimeUtils, how_many_seconds_ago, parse_iso_date};

/// When a cached series stops being good enough to reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessPolicy {
    /// Every call refetches
    AlwaysStale,
    /// Refetch once the entry is older than this many seconds
    MaxAgeSecs(i64),
    /// First successful fetch is kept for the life of the store
    NeverRecheck,
}

/// Cache entry lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Empty,
    Fresh,
    Stale,
}

/// Where the served series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Fetched from the source on this call
    Network,
    /// Served from a fresh cache entry
    Cache,
    /// Fetch failed; the previous (stale) entry was served as a fallback.
    /// This is the user-visible "stale data" warning state.
    StaleFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOutcome {
    pub series: PriceSeries,
    pub provenance: Provenance,
}

/// Serialized cache blob: the normalized series plus fetch metadata.
/// Replaced wholesale on every successful fetch, never patched in place.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CachedSeries {
    pub version: f64,
    pub fetched_at_ms: i64,
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

impl CachedSeries {
    fn from_series(series: &PriceSeries, fetched_at_ms: i64) -> Self {
        Self {
            version: SERIES_VERSION,
            fetched_at_ms,
            dates: series
                .points()
                .iter()
                .map(|p| p.date.format(TimeUtils::STANDARD_TIME_FORMAT).to_string())
                .collect(),
            prices: series.points().iter().map(|p| p.close).collect(),
        }
    }

    fn to_series(&self) -> Result<PriceSeries, ChartError> {
        let mut points = Vec::with_capacity(self.dates.len());
        for (text, close) in self.dates.iter().zip(&self.prices) {
            let date = parse_iso_date(text).ok_or_else(|| {
                ChartError::InvalidInput(format!("bad date in cache blob: {}", text))
            })?;
            points.push(PricePoint { date, close: *close });
        }
        Ok(PriceSeries::from_points(points))
    }
}

type InflightFetch = Shared<BoxFuture<'static, Result<SeriesOutcome, ChartError>>>;

/// Owner of the persisted price series. Decides whether the cached entry is
/// fresh enough to reuse, refetches through the injected source otherwise,
/// and guarantees at most one in-flight fetch per symbol (concurrent callers
/// await the same shared future).
pub struct MarketDataCache {
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn CacheStore>,
    policy: StalenessPolicy,
    serve_stale_on_error: bool,
    inflight: Arc<Mutex<HashMap<String, InflightFetch>>>,
}

impl MarketDataCache {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        store: Arc<dyn CacheStore>,
        policy: StalenessPolicy,
        serve_stale_on_error: bool,
    ) -> Self {
        Self {
            source,
            store,
            policy,
            serve_stale_on_error,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The normalized series for `symbol`, from cache when fresh, otherwise
    /// through the source. Callers get their own copy; the cache entry is
    /// only ever mutated here.
    pub async fn get_series(
        &self,
        symbol: &str,
        range: FetchRange,
        reference_now: DateTime<Utc>,
    ) -> Result<SeriesOutcome, ChartError> {
        let now_ms = reference_now.timestamp_millis();
        let prior = self.load_entry(symbol);

        if self.freshness(prior.as_ref(), now_ms) == Freshness::Fresh {
            let entry = prior.expect("fresh implies an entry");
            return Ok(SeriesOutcome {
                series: entry.to_series()?,
                provenance: Provenance::Cache,
            });
        }

        // Empty or Stale: join the in-flight fetch or start one. The map
        // entry is removed by the fetch future itself, exactly once, when it
        // completes; waiters never touch the map after awaiting, so a slow
        // waiter cannot evict a newer fetch another caller just started.
        let fetch = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(symbol) {
                Some(existing) => existing.clone(),
                None => {
                    let map = Arc::clone(&self.inflight);
                    let key = symbol.to_string();
                    let inner = fetch_and_store(
                        Arc::clone(&self.source),
                        Arc::clone(&self.store),
                        symbol.to_string(),
                        range,
                        prior,
                        self.serve_stale_on_error,
                        now_ms,
                    );
                    let fut = async move {
                        let outcome = inner.await;
                        map.lock().await.remove(&key);
                        outcome
                    }
                    .boxed()
                    .shared();
                    inflight.insert(symbol.to_string(), fut.clone());
                    fut
                }
            }
        };

        fetch.await
    }

    fn load_entry(&self, symbol: &str) -> Option<CachedSeries> {
        let bytes = match self.store.read(symbol) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Cache read failed for {}: {:#}", symbol, e);
                return None;
            }
        };
        match serde_json::from_slice::<CachedSeries>(&bytes) {
            Ok(entry) if entry.version == SERIES_VERSION => Some(entry),
            Ok(entry) => {
                log::warn!(
                    "Cache version mismatch for {}: blob v{} vs required v{}",
                    symbol,
                    entry.version,
                    SERIES_VERSION
                );
                None
            }
            Err(e) => {
                log::warn!("Discarding unreadable cache blob for {}: {}", symbol, e);
                None
            }
        }
    }

    fn freshness(&self, entry: Option<&CachedSeries>, now_ms: i64) -> Freshness {
        let Some(entry) = entry else {
            return Freshness::Empty;
        };
        match self.policy {
            StalenessPolicy::AlwaysStale => Freshness::Stale,
            StalenessPolicy::NeverRecheck => Freshness::Fresh,
            StalenessPolicy::MaxAgeSecs(limit) => {
                if how_many_seconds_ago(entry.fetched_at_ms, now_ms) > limit {
                    Freshness::Stale
                } else {
                    Freshness::Fresh
                }
            }
        }
    }
}

/// The actual fetch path, detached from `&self` so it can live in the shared
/// in-flight map: fetch, normalize, replace the stored blob wholesale, or
/// fall back to the prior entry when allowed.
async fn fetch_and_store(
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn CacheStore>,
    symbol: String,
    range: FetchRange,
    prior: Option<CachedSeries>,
    serve_stale_on_error: bool,
    now_ms: i64,
) -> Result<SeriesOutcome, ChartError> {
    let raw: RawMarketData = match source.fetch(&symbol, range).await {
        Ok(raw) => raw,
        Err(e) => {
            if let (true, Some(prior)) = (serve_stale_on_error, prior) {
                log::warn!(
                    "Fetch failed for {} ({:#}); serving stale cache entry",
                    symbol,
                    e
                );
                return Ok(SeriesOutcome {
                    series: prior.to_series()?,
                    provenance: Provenance::StaleFallback,
                });
            }
            return Err(ChartError::DataUnavailable(format!("{:#}", e)));
        }
    };

    let (dates, prices) = raw.daily_closes();
    let series = PriceSeries::normalize(&dates, &prices)?;

    let blob = CachedSeries::from_series(&series, now_ms);
    let bytes = serde_json::to_vec(&blob)
        .map_err(|e| ChartError::InvalidInput(format!("cache blob serialization: {}", e)))?;
    if let Err(e) = store.write(&symbol, &bytes) {
        // A broken store should not take down the render path
        log::error!("Cache write failed for {}: {:#}", symbol, e);
    }

    Ok(SeriesOutcome {
        series,
        provenance: Provenance::Network,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::MemoryStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockSource {
        fetches: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        fail: bool,
    }

    impl MockSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                fail,
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn max_concurrent(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        fn signature(&self) -> &'static str {
            "Mock"
        }

        async fn fetch(&self, _symbol: &str, _range: FetchRange) -> anyhow::Result<RawMarketData> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            // Yield so concurrent callers can pile onto the in-flight entry
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("simulated network failure"));
            }
            Ok(RawMarketData {
                dates: vec!["2024-01-01".into(), "2024-01-04".into()],
                prices: vec![100.0, 400.0],
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn cache_with(source: Arc<MockSource>, policy: StalenessPolicy) -> MarketDataCache {
        MarketDataCache::new(source, Arc::new(MemoryStore::new()), policy, true)
    }

    #[tokio::test]
    async fn test_fetch_normalizes_and_persists() {
        let source = MockSource::new(false);
        let cache = cache_with(Arc::clone(&source), StalenessPolicy::MaxAgeSecs(86_400));

        let outcome = cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();
        assert_eq!(outcome.provenance, Provenance::Network);
        // Gap-filled to one point per day
        assert_eq!(outcome.series.len(), 4);

        // Second call inside the freshness window is served from cache
        let outcome = cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();
        assert_eq!(outcome.provenance, Provenance::Cache);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_single_flight_shares_one_fetch() {
        let source = MockSource::new(false);
        let cache = cache_with(Arc::clone(&source), StalenessPolicy::AlwaysStale);

        let (a, b) = tokio::join!(
            cache.get_series("bitcoin", FetchRange::Max, now()),
            cache.get_series("bitcoin", FetchRange::Max, now()),
        );
        assert_eq!(a.unwrap().series.len(), 4);
        assert_eq!(b.unwrap().series.len(), 4);
        assert_eq!(source.fetch_count(), 1, "concurrent callers must share one fetch");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_flight_survives_churn() {
        // Waiters finishing an old fetch must not evict a newer in-flight
        // entry: hammer the cache from many tasks and assert the source never
        // sees two overlapping fetches for the one symbol.
        let source = MockSource::new(false);
        let cache = Arc::new(cache_with(Arc::clone(&source), StalenessPolicy::AlwaysStale));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                for _ in 0..25 {
                    cache
                        .get_series("bitcoin", FetchRange::Max, now())
                        .await
                        .unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(source.fetch_count() >= 1);
        assert_eq!(
            source.max_concurrent(),
            1,
            "at most one in-flight fetch per symbol"
        );
    }

    #[tokio::test]
    async fn test_always_stale_refetches_sequentially() {
        let source = MockSource::new(false);
        let cache = cache_with(Arc::clone(&source), StalenessPolicy::AlwaysStale);

        cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();
        cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_fallback_on_fetch_failure() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());

        // Seed the store through a working source
        let good = MockSource::new(false);
        let cache = MarketDataCache::new(
            good,
            Arc::clone(&store),
            StalenessPolicy::AlwaysStale,
            true,
        );
        cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();

        // Same store, broken source
        let broken = MockSource::new(true);
        let cache = MarketDataCache::new(
            Arc::clone(&broken) as Arc<dyn MarketDataSource>,
            Arc::clone(&store),
            StalenessPolicy::AlwaysStale,
            true,
        );
        let outcome = cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();
        assert_eq!(outcome.provenance, Provenance::StaleFallback);
        assert_eq!(outcome.series.len(), 4);
    }

    #[tokio::test]
    async fn test_data_unavailable_without_prior_entry() {
        let broken = MockSource::new(true);
        let cache = cache_with(broken, StalenessPolicy::MaxAgeSecs(86_400));

        let err = cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_never_recheck_skips_network() {
        let source = MockSource::new(false);
        let cache = cache_with(Arc::clone(&source), StalenessPolicy::NeverRecheck);

        cache
            .get_series("bitcoin", FetchRange::Max, now())
            .await
            .unwrap();
        // A week later the entry is still served without a fetch
        let later = now() + chrono::Duration::days(7);
        let outcome = cache
            .get_series("bitcoin", FetchRange::Max, later)
            .await
            .unwrap();
        assert_eq!(outcome.provenance, Provenance::Cache);
        assert_eq!(source.fetch_count(), 1);
    }
}
