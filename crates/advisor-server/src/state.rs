//! Application State

use std::sync::Arc;

use consolidation_advisor::{ChartFormat, ConsolidationAdvisor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Optimizer + chart renderer; stateless, shared by every session
    pub advisor: Arc<ConsolidationAdvisor>,

    /// Chart encoding in use
    pub chart_format: ChartFormat,
}
