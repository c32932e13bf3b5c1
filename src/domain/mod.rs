// Core chart domain: price series, time windows, projections
pub mod projection;
pub mod series;
pub mod window;

pub use projection::{ClassifiedProjection, ProjectionRecord, ProjectionTag};
pub use series::{PricePoint, PriceSeries};
pub use window::{TimeWindow, WindowEnd, WindowSelector};
