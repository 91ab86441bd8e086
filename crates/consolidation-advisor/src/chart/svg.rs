//! Bar chart layout
//!
//! Charts are drawn with plotters on its SVG backend. The PNG renderer
//! rasterizes the same document, so both formats share one layout.

use std::ops::Range;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_backend::text_anchor::{HPos, Pos, VPos};
use rust_decimal::Decimal;

use super::{ChartRenderer, ChartStyle, prepare_series};
use crate::error::{AdvisorError, Result};

const MARGIN: i32 = 20;
const X_LABEL_AREA: i32 = 70;
const Y_LABEL_AREA: i32 = 100;

/// Fraction of each slot taken by its bar
const BAR_FILL: f64 = 0.7;
const Y_TICKS: usize = 6;

const TITLE_SIZE: f64 = 26.0;
const AXIS_DESC_SIZE: f64 = 18.0;
const TICK_LABEL_SIZE: f64 = 15.0;

/// Pixel geometry of a drawn chart
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,

    /// Pixel row of the zero line
    pub baseline: i32,
}

/// Value axis range; always spans zero, with headroom for bar labels
pub(crate) fn value_range(values: &[f64]) -> Range<f64> {
    let mut lo = values.iter().copied().fold(0.0_f64, f64::min);
    let mut hi = values.iter().copied().fold(0.0_f64, f64::max);
    if (hi - lo).abs() < f64::EPSILON {
        hi = 1.0;
    }

    let pad = (hi - lo) * 0.1;
    if hi > 0.0 {
        hi += pad;
    }
    if lo < 0.0 {
        lo -= pad;
    }
    lo..hi
}

/// Color of bar `idx` out of `count`, spread evenly over viridis
fn bar_color(idx: usize, count: usize) -> RGBColor {
    let t = if count > 1 {
        idx as f32 / (count - 1) as f32
    } else {
        0.0
    };
    ViridisRGB.get_color(t)
}

/// Compose a bar chart as an SVG document
///
/// `values` must already be aligned with `labels`; the bar at `highlight`
/// gets the larger value label.
pub fn compose_svg(
    labels: &[String],
    values: &[f64],
    highlight: usize,
    style: &ChartStyle,
) -> Result<String> {
    draw_svg(labels, values, highlight, style).map(|(svg, _)| svg)
}

/// Compose the SVG document and report where the plot landed
pub(crate) fn draw_svg(
    labels: &[String],
    values: &[f64],
    highlight: usize,
    style: &ChartStyle,
) -> Result<(String, Frame)> {
    let mut svg = String::new();
    let frame = {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        draw_bars(&root, labels, values, highlight, style)
            .map_err(|e| AdvisorError::Render(format!("chart layout failed: {e}")))?
    };
    Ok((svg, frame))
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    labels: &[String],
    values: &[f64],
    highlight: usize,
    style: &ChartStyle,
) -> std::result::Result<Frame, DrawingAreaErrorKind<DB::ErrorType>> {
    let fg = style.foreground;
    let font = |size: f64, weight: FontStyle| {
        FontDesc::new(FontFamily::Name(&style.font_family), size, weight).color(&fg)
    };

    root.fill(&style.background)?;

    let count = labels.len();
    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .caption(&style.title, font(TITLE_SIZE, FontStyle::Bold))
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d((0..count).into_segmented(), value_range(values))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .y_labels(Y_TICKS)
        .bold_line_style(fg.mix(style.grid_opacity))
        .light_line_style(TRANSPARENT)
        .axis_style(fg.mix(0.8))
        .label_style(font(TICK_LABEL_SIZE, FontStyle::Normal))
        .axis_desc_style(font(AXIS_DESC_SIZE, FontStyle::Bold))
        .x_desc(&style.x_label)
        .y_desc(&style.y_label)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(idx) => labels.get(*idx).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;

    let (x_px, y_px) = chart.plotting_area().get_pixel_range();
    let slot = f64::from(x_px.end - x_px.start) / count as f64;
    let inset = (slot * (1.0 - BAR_FILL) / 2.0).round() as u32;

    chart.draw_series(values.iter().enumerate().map(|(idx, &value)| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(idx), value.max(0.0)),
                (SegmentValue::Exact(idx + 1), value.min(0.0)),
            ],
            bar_color(idx, count).filled(),
        );
        bar.set_margin(0, 0, inset, inset);
        bar
    }))?;

    chart.draw_series(values.iter().enumerate().map(|(idx, &value)| {
        let size = if idx == highlight {
            style.highlight_label_size
        } else {
            style.label_size
        };
        Text::new(
            format!("{value:.2}"),
            (SegmentValue::CenterOf(idx), value / 2.0),
            font(size, FontStyle::Bold).pos(Pos::new(HPos::Center, VPos::Center)),
        )
    }))?;

    let baseline = chart.backend_coord(&(SegmentValue::Exact(0), 0.0)).1;
    root.present()?;

    Ok(Frame {
        left: x_px.start,
        right: x_px.end,
        top: y_px.start,
        bottom: y_px.end,
        baseline,
    })
}

/// Returns the SVG document itself
pub struct SvgChartRenderer {
    style: ChartStyle,
}

impl SvgChartRenderer {
    pub const fn new(style: ChartStyle) -> Self {
        Self { style }
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, labels: &[String], values: &[Decimal], highlight: usize) -> Result<Vec<u8>> {
        let values = prepare_series(labels, values, highlight)?;
        Ok(compose_svg(labels, &values, highlight, &self.style)?.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}
