//! Consolidation Advisor
//!
//! Runs the optimizer and draws the comparison chart in one step. The
//! caller needs both the summary and the image, so a failure in either
//! fails the whole call.

use std::sync::Arc;

use crate::chart::{ChartFormat, ChartRenderer, ChartStyle};
use crate::error::Result;
use crate::model::{ConsolidationRequest, OptimizationResult};

/// Result plus its rendered chart
#[derive(Clone, Debug)]
pub struct Advice {
    pub result: OptimizationResult,

    /// Encoded chart image
    pub chart: Vec<u8>,

    /// MIME type of `chart`
    pub content_type: &'static str,

    /// Suggested attachment name
    pub file_name: String,
}

impl Advice {
    /// Text shown next to the chart
    pub fn summary(&self) -> String {
        self.result.to_string()
    }
}

/// Produces advice for consolidation requests
pub struct ConsolidationAdvisor {
    renderer: Arc<dyn ChartRenderer>,
}

impl Default for ConsolidationAdvisor {
    fn default() -> Self {
        Self::with_format(ChartFormat::default(), ChartStyle::default())
    }
}

impl ConsolidationAdvisor {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { renderer }
    }

    pub fn with_format(format: ChartFormat, style: ChartStyle) -> Self {
        Self::new(format.renderer(style))
    }

    /// MIME type of the charts this advisor produces
    pub fn content_type(&self) -> &'static str {
        self.renderer.content_type()
    }

    /// Optimize the request and chart the comparison series
    pub fn advise(&self, request: &ConsolidationRequest) -> Result<Advice> {
        let result = request.optimize()?;

        let chart = self
            .renderer
            .render(&result.labels(), &result.values(), result.best_index)?;

        tracing::info!(
            platforms = request.len(),
            best = %result.best_platform,
            chart_bytes = chart.len(),
            "Consolidation advice ready"
        );

        Ok(Advice {
            result,
            chart,
            content_type: self.renderer.content_type(),
            file_name: format!("result.{}", self.renderer.extension()),
        })
    }
}
