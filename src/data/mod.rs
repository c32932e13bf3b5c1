// Data acquisition, caching, and projection supply
pub mod cache;
pub mod projections;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use cache::{MarketDataCache, Provenance, SeriesOutcome, StalenessPolicy};
pub use projections::{DummyProjectionSource, ProjectionSource};
pub use source::{CoinGeckoSource, FetchRange, MarketDataSource, RawMarketData};
pub use store::{CacheStore, FileStore, MemoryStore};
