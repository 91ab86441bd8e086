//! Comparison Charts
//!
//! Bar charts of the comparison series, laid out with plotters. Every render
//! builds its own SVG document and, for raster output, its own pixmap, so
//! concurrent renders never share drawing state.

mod raster;
mod svg;

pub use raster::PngChartRenderer;
pub use svg::{SvgChartRenderer, compose_svg};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use plotters::style::{RGBColor, WHITE};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{AdvisorError, Result};

/// Chart renderer trait (Strategy pattern)
///
/// Given a labeled series and the index of the winning entry, produce an
/// encoded image.
pub trait ChartRenderer: Send + Sync {
    /// Render a bar chart, emphasizing the bar at `highlight`
    fn render(&self, labels: &[String], values: &[Decimal], highlight: usize) -> Result<Vec<u8>>;

    /// MIME type of the encoded output
    fn content_type(&self) -> &'static str;

    /// File extension for attachments
    fn extension(&self) -> &'static str;
}

/// Output encoding for charts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    /// Build the renderer for this format
    pub fn renderer(self, style: ChartStyle) -> Arc<dyn ChartRenderer> {
        match self {
            Self::Png => Arc::new(PngChartRenderer::new(style)),
            Self::Svg => Arc::new(SvgChartRenderer::new(style)),
        }
    }
}

impl FromStr for ChartFormat {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            other => Err(AdvisorError::InvalidChart(format!(
                "unknown chart format '{other}' (expected 'png' or 'svg')"
            ))),
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("png"),
            Self::Svg => f.write_str("svg"),
        }
    }
}

/// Visual settings for comparison charts
#[derive(Clone, Debug)]
pub struct ChartStyle {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    pub title: String,
    pub x_label: String,
    pub y_label: String,

    /// Value label size on ordinary bars
    pub label_size: f64,

    /// Value label size on the winning bar
    pub highlight_label_size: f64,

    pub background: RGBColor,

    /// Text, axes and grid
    pub foreground: RGBColor,

    /// Opacity of horizontal grid lines
    pub grid_opacity: f64,

    /// Family used for every label; the PNG renderer bundles it
    pub font_family: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title: "Projected Returns after Consolidating Funds".into(),
            x_label: "Platform".into(),
            y_label: "Projected Return ($) daily".into(),
            label_size: 20.0,
            highlight_label_size: 36.0,
            background: RGBColor(0x13, 0x17, 0x22),
            foreground: WHITE,
            grid_opacity: 0.5,
            font_family: "DejaVu Sans".into(),
        }
    }
}

/// Validate a series and convert it to drawing coordinates
fn prepare_series(labels: &[String], values: &[Decimal], highlight: usize) -> Result<Vec<f64>> {
    if labels.len() != values.len() {
        return Err(AdvisorError::shape("values", labels.len(), values.len()));
    }
    if labels.is_empty() {
        return Err(AdvisorError::InvalidChart("nothing to plot".into()));
    }
    if highlight >= labels.len() {
        return Err(AdvisorError::InvalidChart(format!(
            "highlight index {highlight} is outside {} bars",
            labels.len()
        )));
    }

    values
        .iter()
        .map(|v| {
            v.to_f64()
                .ok_or_else(|| AdvisorError::InvalidChart(format!("{v} is not plottable")))
        })
        .collect()
}
