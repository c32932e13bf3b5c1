use serde::{Deserialize, Serialize};

use crate::config::chart::Margins;
use crate::config::CHART;

/// Which panes a render shows.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
pub enum RenderContext {
    #[strum(to_string = "Market")]
    HistoricalOnly,
    #[default]
    #[strum(to_string = "Hybrid")]
    Hybrid,
    #[strum(to_string = "Outlook")]
    ProjectionOnly,
}

/// Pixel rectangle of one pane plus the overflow bands reserved next to it.
/// The lateral band sits immediately right of `x + width`; the top band sits
/// immediately above `y`. Both are zero unless the max-span window is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaneGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub overflow_width: f32,
    pub overflow_height: f32,
}

/// Geometry for one render: up to two panes and the divider between them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaneLayout {
    pub historical: Option<PaneGeometry>,
    pub projection: Option<PaneGeometry>,
    /// Midline X of the hybrid split, where the dashed divider is drawn
    pub divider_x: Option<f32>,
}

impl PaneLayout {
    /// Carve the container into pane rectangles.
    ///
    /// Hybrid splits the container at its midpoint: historical takes the left
    /// half minus the left margin, projection the right half minus the right
    /// margin. `reserve_overflow` (max-span windows only) shaves a fixed band
    /// off the projection pane's right edge and top for out-of-domain data.
    ///
    /// Invariants, tested below: panes never overlap, and pane widths plus
    /// margins plus overflow bands add back up to `container_width`.
    pub fn compute(
        container_width: f32,
        container_height: f32,
        margins: Margins,
        context: RenderContext,
        reserve_overflow: bool,
    ) -> PaneLayout {
        let usable_width = container_width - margins.left - margins.right;
        let usable_height = container_height - margins.top - margins.bottom;
        let middle = container_width / 2.0;
        let band = if reserve_overflow {
            CHART.overflow_band_px
        } else {
            0.0
        };

        let full_pane = |width: f32| PaneGeometry {
            x: margins.left,
            y: margins.top,
            width,
            height: usable_height,
            overflow_width: 0.0,
            overflow_height: 0.0,
        };

        match context {
            RenderContext::HistoricalOnly => PaneLayout {
                historical: Some(full_pane(usable_width)),
                projection: None,
                divider_x: None,
            },
            RenderContext::Hybrid => {
                let historical = PaneGeometry {
                    x: margins.left,
                    y: margins.top,
                    width: middle - margins.left,
                    height: usable_height,
                    overflow_width: 0.0,
                    overflow_height: 0.0,
                };
                let projection = PaneGeometry {
                    x: middle,
                    y: margins.top + band,
                    width: middle - margins.right - band,
                    height: usable_height - band,
                    overflow_width: band,
                    overflow_height: band,
                };
                PaneLayout {
                    historical: Some(historical),
                    projection: Some(projection),
                    divider_x: Some(middle),
                }
            }
            RenderContext::ProjectionOnly => {
                let mut pane = full_pane(usable_width - band);
                pane.y += band;
                pane.height -= band;
                pane.overflow_width = band;
                pane.overflow_height = band;
                PaneLayout {
                    historical: None,
                    projection: Some(pane),
                    divider_x: None,
                }
            }
        }
    }

    /// Horizontal accounting: margins + pane widths + overflow bands.
    /// Exposed for tests and debug assertions.
    pub fn occupied_width(&self, margins: Margins) -> f32 {
        let historical = self.historical.map_or(0.0, |p| p.width + p.overflow_width);
        let projection = self.projection.map_or(0.0, |p| p.width + p.overflow_width);
        margins.left + historical + projection + margins.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGINS: Margins = Margins {
        top: 20.0,
        right: 70.0,
        bottom: 50.0,
        left: 70.0,
    };

    fn overlaps(a: &PaneGeometry, b: &PaneGeometry) -> bool {
        a.x < b.x + b.width + b.overflow_width
            && b.x < a.x + a.width + a.overflow_width
            && a.y < b.y + b.height
            && b.y < a.y + a.height
    }

    #[test]
    fn test_historical_only_fills_usable_area() {
        let layout = PaneLayout::compute(2540.0, 540.0, MARGINS, RenderContext::HistoricalOnly, false);
        let pane = layout.historical.unwrap();
        assert!(layout.projection.is_none());
        assert_eq!(pane.x, 70.0);
        assert_eq!(pane.width, 2540.0 - 70.0 - 70.0);
        assert_eq!(pane.height, 540.0 - 20.0 - 50.0);
        assert_eq!(layout.occupied_width(MARGINS), 2540.0);
    }

    #[test]
    fn test_hybrid_splits_at_midline() {
        let layout = PaneLayout::compute(2540.0, 540.0, MARGINS, RenderContext::Hybrid, false);
        let historical = layout.historical.unwrap();
        let projection = layout.projection.unwrap();

        assert_eq!(layout.divider_x, Some(1270.0));
        assert_eq!(historical.x + historical.width, 1270.0);
        assert_eq!(projection.x, 1270.0);
        assert_eq!(historical.width, 1270.0 - 70.0);
        assert_eq!(projection.width, 1270.0 - 70.0);
        assert!(!overlaps(&historical, &projection));
        assert_eq!(layout.occupied_width(MARGINS), 2540.0);
    }

    #[test]
    fn test_hybrid_overflow_bands() {
        let layout = PaneLayout::compute(2540.0, 540.0, MARGINS, RenderContext::Hybrid, true);
        let historical = layout.historical.unwrap();
        let projection = layout.projection.unwrap();

        assert_eq!(projection.overflow_width, 50.0);
        assert_eq!(projection.overflow_height, 50.0);
        assert_eq!(historical.overflow_width, 0.0);
        // Band comes out of the projection pane, not the margins
        assert_eq!(projection.width, 1270.0 - 70.0 - 50.0);
        assert_eq!(projection.y, 20.0 + 50.0);
        assert!(!overlaps(&historical, &projection));
        assert_eq!(layout.occupied_width(MARGINS), 2540.0);
    }

    #[test]
    fn test_projection_only_with_overflow() {
        let layout =
            PaneLayout::compute(800.0, 400.0, MARGINS, RenderContext::ProjectionOnly, true);
        let pane = layout.projection.unwrap();
        assert!(layout.historical.is_none());
        assert_eq!(pane.overflow_width, 50.0);
        assert_eq!(pane.width, 800.0 - 70.0 - 70.0 - 50.0);
        assert_eq!(layout.occupied_width(MARGINS), 800.0);
    }
}
