//! Painter-based pane renderer. Everything here reads a finished
//! [`RenderPlan`]; no chart math happens at draw time.

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Shape, Stroke, Vec2};

use crate::chart::layout::PaneGeometry;
use crate::chart::scale::{AxisScale, format_thousands};
use crate::chart::ticks::format_tick;
use crate::config::CHART;
use crate::domain::projection::{ClassifiedProjection, ProjectionTag, Relation};
use crate::domain::series::PriceSeries;
use crate::domain::window::TimeWindow;
use crate::engine::RenderPlan;

const AXIS_FONT: f32 = 11.0;
const PRICE_LINE_WIDTH: f32 = 1.5;
const MIN_RANGE_WIDTH: f32 = 1.0;

/// Pixel rectangle for a pane, offset into the widget's screen space.
fn pane_rect(pane: &PaneGeometry, origin: Pos2) -> Rect {
    Rect::from_min_size(
        origin + Vec2::new(pane.x, pane.y),
        Vec2::new(pane.width, pane.height),
    )
}

/// Date to X pixel across `rect`, with `[start, end]` as the time domain.
fn x_of(rect: Rect, domain: (NaiveDate, NaiveDate), date: NaiveDate) -> f32 {
    let span = (domain.1 - domain.0).num_days().max(1) as f32;
    let offset = (date - domain.0).num_days() as f32;
    rect.left() + (offset / span).clamp(0.0, 1.0) * rect.width()
}

/// Price to Y pixel via the shared scale (axis bottom is the rect bottom).
fn y_of(rect: Rect, scale: &AxisScale, price: f64) -> f32 {
    rect.bottom() - scale.position_of(price) as f32 * rect.height()
}

pub fn draw(ui: &mut egui::Ui, plan: &RenderPlan) {
    let container = ui.available_rect_before_wrap();
    let painter = ui.painter_at(container);
    let origin = container.min;

    if let Some(pane) = &plan.layout.historical {
        draw_historical(&painter, plan, pane, origin);
    }
    if let Some(pane) = &plan.layout.projection {
        draw_projection(&painter, plan, pane, origin);
    }
    if let Some(divider_x) = plan.layout.divider_x {
        draw_divider(&painter, plan, divider_x, origin);
    }
}

fn draw_historical(painter: &egui::Painter, plan: &RenderPlan, pane: &PaneGeometry, origin: Pos2) {
    let rect = pane_rect(pane, origin);
    painter.rect_filled(rect, CornerRadius::same(4), CHART.historical_background);

    draw_price_grid(painter, &plan.scale, rect);

    // Y labels on the outer (left) edge
    for &tick in &plan.scale.tick_values {
        painter.text(
            Pos2::new(rect.left() - 6.0, y_of(rect, &plan.scale, tick)),
            Align2::RIGHT_CENTER,
            format_thousands(tick),
            FontId::proportional(AXIS_FONT),
            CHART.axis_label_color,
        );
    }

    let domain = (plan.window.start, plan.window.end_or(plan.today));
    draw_price_line(painter, &plan.historical, rect, &plan.scale, domain);

    for &tick in &plan.x_ticks {
        painter.text(
            Pos2::new(x_of(rect, domain, tick), rect.bottom() + 6.0),
            Align2::CENTER_TOP,
            format_tick(tick, plan.selector),
            FontId::proportional(AXIS_FONT),
            CHART.axis_label_color,
        );
    }

    // Today marker on the latest historical point, at the pane's right edge
    if let Some(latest) = plan.historical.latest() {
        let center = Pos2::new(
            x_of(rect, domain, latest.date),
            y_of(rect, &plan.scale, latest.close),
        );
        painter.circle_filled(
            center,
            CHART.today_marker_outer_radius,
            CHART.price_line_color.gamma_multiply(0.35),
        );
        painter.circle_filled(center, CHART.today_marker_inner_radius, CHART.price_line_color);
    }
}

fn draw_projection(painter: &egui::Painter, plan: &RenderPlan, pane: &PaneGeometry, origin: Pos2) {
    let rect = pane_rect(pane, origin);
    painter.rect_filled(rect, CornerRadius::same(4), CHART.projection_background);

    draw_price_grid(painter, &plan.scale, rect);

    // Y labels mirrored onto the outer (right) edge, past the overflow band
    for &tick in &plan.scale.tick_values {
        painter.text(
            Pos2::new(rect.right() + pane.overflow_width + 6.0, y_of(rect, &plan.scale, tick)),
            Align2::LEFT_CENTER,
            format_thousands(tick),
            FontId::proportional(AXIS_FONT),
            CHART.axis_label_color,
        );
    }

    let horizon = TimeWindow::projection_horizon(plan.today);
    let domain = (horizon.start, horizon.end_or(plan.today));

    for classified in &plan.projections {
        draw_range(painter, plan, rect, domain, classified);
    }

    // YTD actuals continue the price line right of the divider, on its own
    // current-year time domain
    if !plan.projection_actuals.is_empty() {
        let year_start =
            NaiveDate::from_ymd_opt(plan.today.year(), 1, 1).expect("Jan 1 always exists");
        let year_end =
            NaiveDate::from_ymd_opt(plan.today.year(), 12, 31).expect("Dec 31 always exists");
        draw_price_line(
            painter,
            &plan.projection_actuals,
            rect,
            &plan.scale,
            (year_start, year_end),
        );
    }

    draw_overflow_bands(painter, plan, pane, rect);
}

fn draw_price_grid(painter: &egui::Painter, scale: &AxisScale, rect: Rect) {
    for &tick in &scale.tick_values {
        let y = y_of(rect, scale, tick);
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(0.5, CHART.grid_line_color),
        );
    }
}

fn draw_price_line(
    painter: &egui::Painter,
    series: &PriceSeries,
    rect: Rect,
    scale: &AxisScale,
    domain: (NaiveDate, NaiveDate),
) {
    let stroke = Stroke::new(PRICE_LINE_WIDTH, CHART.price_line_color);
    for pair in series.points().windows(2) {
        painter.line_segment(
            [
                Pos2::new(x_of(rect, domain, pair[0].date), y_of(rect, scale, pair[0].close)),
                Pos2::new(x_of(rect, domain, pair[1].date), y_of(rect, scale, pair[1].close)),
            ],
            stroke,
        );
    }
}

/// One projection record: a vertical range bar split into bullish (above
/// today's price) and bearish (below) segments, or a dot for point records.
/// Overflow-tagged records are deferred to the bands.
fn draw_range(
    painter: &egui::Painter,
    plan: &RenderPlan,
    rect: Rect,
    domain: (NaiveDate, NaiveDate),
    classified: &ClassifiedProjection,
) {
    if classified.tag != ProjectionTag::InRange {
        return;
    }
    let record = &classified.record;

    let x0 = x_of(rect, domain, record.start_date);
    let x1 = x_of(rect, domain, record.end_date).max(x0 + MIN_RANGE_WIDTH);

    if classified.is_point {
        let color = match record.relation_to(plan.today_price) {
            Relation::Above => CHART.bullish_range_color,
            _ => CHART.bearish_range_color,
        };
        painter.circle_filled(
            Pos2::new(x0, y_of(rect, &plan.scale, record.min_value)),
            2.5,
            color,
        );
        return;
    }

    let y_top = y_of(rect, &plan.scale, record.max_value);
    let y_bottom = y_of(rect, &plan.scale, record.min_value);
    let y_split = y_of(rect, &plan.scale, plan.today_price);

    let relation = record.relation_to(plan.today_price);
    for (segment, color) in range_segments(x0, x1, y_top, y_bottom, y_split, relation) {
        painter.rect_filled(segment, CornerRadius::same(1), color);
    }
}

/// Pixel segments for one range bar: a single rect when the range sits
/// entirely on one side of today's price, two stacked rects meeting at the
/// split line when it straddles it.
fn range_segments(
    x0: f32,
    x1: f32,
    y_top: f32,
    y_bottom: f32,
    y_split: f32,
    relation: Relation,
) -> Vec<(Rect, Color32)> {
    let bar = Rect::from_min_max(Pos2::new(x0, y_top), Pos2::new(x1, y_bottom));
    match relation {
        Relation::Above => vec![(bar, CHART.bullish_range_color)],
        Relation::Below => vec![(bar, CHART.bearish_range_color)],
        Relation::Straddles => vec![
            (
                Rect::from_min_max(Pos2::new(x0, y_top), Pos2::new(x1, y_split)),
                CHART.bullish_range_color,
            ),
            (
                Rect::from_min_max(Pos2::new(x0, y_split), Pos2::new(x1, y_bottom)),
                CHART.bearish_range_color,
            ),
        ],
    }
}

/// The fixed strips reserved on max-span windows: lateral for records beyond
/// the ten-year window, top for records above the axis ceiling. Markers only
/// appear when such records exist; the strips themselves always render once
/// reserved so the pane width stays stable.
fn draw_overflow_bands(
    painter: &egui::Painter,
    plan: &RenderPlan,
    pane: &PaneGeometry,
    rect: Rect,
) {
    if pane.overflow_width <= 0.0 {
        return;
    }

    let lateral = Rect::from_min_size(
        Pos2::new(rect.right(), rect.top()),
        Vec2::new(pane.overflow_width, rect.height()),
    );
    let top = Rect::from_min_size(
        Pos2::new(rect.left(), rect.top() - pane.overflow_height),
        Vec2::new(rect.width(), pane.overflow_height),
    );
    painter.rect_filled(lateral, CornerRadius::ZERO, CHART.overflow_band_color);
    painter.rect_filled(top, CornerRadius::ZERO, CHART.overflow_band_color);

    let mut beyond_window = false;
    let mut above_axis = false;
    for classified in &plan.projections {
        let record = &classified.record;
        let color = match record.relation_to(plan.today_price) {
            Relation::Above => CHART.bullish_range_color,
            _ => CHART.bearish_range_color,
        };
        match classified.tag {
            ProjectionTag::InRange => {}
            ProjectionTag::BeyondWindowOverflow => {
                beyond_window = true;
                let y = y_of(rect, &plan.scale, record.max_value.min(plan.scale.domain_max));
                painter.circle_filled(Pos2::new(lateral.center().x, y), 2.5, color);
            }
            ProjectionTag::AboveAxisOverflow => {
                above_axis = true;
                let horizon = TimeWindow::projection_horizon(plan.today);
                let x = x_of(rect, (horizon.start, horizon.end_or(plan.today)), record.start_date);
                painter.circle_filled(Pos2::new(x, top.center().y), 2.5, color);
            }
            ProjectionTag::BothOverflow => {
                beyond_window = true;
                above_axis = true;
                painter.circle_filled(
                    Pos2::new(lateral.center().x, top.center().y),
                    2.5,
                    color,
                );
            }
        }
    }

    let label_font = FontId::proportional(AXIS_FONT);
    if beyond_window {
        painter.text(
            lateral.center(),
            Align2::CENTER_CENTER,
            "+10YRS",
            label_font.clone(),
            Color32::DARK_GRAY,
        );
    }
    if above_axis {
        painter.text(
            top.center(),
            Align2::CENTER_CENTER,
            "+3X",
            label_font,
            Color32::DARK_GRAY,
        );
    }
}

fn draw_divider(painter: &egui::Painter, plan: &RenderPlan, divider_x: f32, origin: Pos2) {
    let Some(pane) = plan.layout.projection else {
        return;
    };
    let x = origin.x + divider_x;
    let top = origin.y + pane.y;
    let bottom = origin.y + pane.y + pane.height;
    painter.add(Shape::dashed_line(
        &[Pos2::new(x, top), Pos2::new(x, bottom)],
        Stroke::new(1.0, CHART.divider_color),
        4.0,
        4.0,
    ));
}
