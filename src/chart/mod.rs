// Shared-axis scaling and dual-pane geometry
pub mod layout;
pub mod scale;
pub mod ticks;

pub use layout::{PaneGeometry, PaneLayout, RenderContext};
pub use scale::AxisScale;
