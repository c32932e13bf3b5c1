//! Chart scale and layout configuration

use eframe::egui::Color32;

/// Margins around the drawable chart area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

pub struct ChartConfig {
    /// Headroom multiplier applied to the highest close when deriving the
    /// axis top
    pub headroom_factor: f64,
    /// Cap on the axis top, as a multiple of today's price
    pub today_cap_multiple: f64,
    /// Number of tick intervals on the shared price axis (labels = intervals + 1)
    pub tick_intervals: usize,
    /// Fixed pixel size of the overflow bands reserved on max-span windows
    pub overflow_band_px: f32,
    /// Default pane margins
    pub margins: Margins,
    /// Years of projection horizon to the right of "today"
    pub projection_horizon_years: i32,

    // Renderer colors
    pub historical_background: Color32,
    pub projection_background: Color32,
    pub price_line_color: Color32,
    pub grid_line_color: Color32,
    pub axis_label_color: Color32,
    pub bullish_range_color: Color32,
    pub bearish_range_color: Color32,
    pub overflow_band_color: Color32,
    pub divider_color: Color32,
    pub today_marker_outer_radius: f32,
    pub today_marker_inner_radius: f32,
}

pub const CHART: ChartConfig = ChartConfig {
    headroom_factor: 1.3,
    today_cap_multiple: 3.0,
    tick_intervals: 9,
    overflow_band_px: 50.0,
    margins: Margins {
        top: 20.0,
        right: 70.0,
        bottom: 50.0,
        left: 70.0,
    },
    projection_horizon_years: 10,

    historical_background: Color32::from_rgb(0x29, 0x3C, 0x4B),
    projection_background: Color32::WHITE,
    price_line_color: Color32::from_rgb(0x17, 0xA2, 0xB8),
    grid_line_color: Color32::from_rgb(0x3A, 0x4B, 0x59),
    axis_label_color: Color32::from_rgb(0xD6, 0xD9, 0xDC),
    bullish_range_color: Color32::from_rgb(0x24, 0xC6, 0xC8),
    bearish_range_color: Color32::from_rgb(0xED, 0x56, 0x66),
    overflow_band_color: Color32::from_rgb(0xEC, 0xEC, 0xEC),
    divider_color: Color32::from_rgb(0xBD, 0xC2, 0xC7),
    today_marker_outer_radius: 9.0,
    today_marker_inner_radius: 4.5,
};
