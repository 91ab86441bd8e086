//! # consolidation-advisor
//!
//! Decides whether moving every balance into a single platform earns more
//! per day than leaving funds spread across platforms, after transfer fees.
//!
//! ## How a request is scored
//!
//! - **Status quo** - every platform keeps earning its own APR / 365
//! - **Consolidate into j** - all balances move to j; every platform holding
//!   money pays its fee into j, and the remainder earns j's daily rate
//! - **Pick the best** - first maximum wins, so the status quo wins ties
//!
//! ## Example
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  A $1000 @10%   B $2000 @20%   C $0 @30%                   │
//! ├────────────────────────────────────────────────────────────┤
//! │  Status Quo  ███████████             $1.37/day             │
//! │  → A         ███████                 $0.82/day  (fees $5)  │
//! │  → B         █████████████           $1.64/day  (fees $5)  │
//! │  → C         ████████████████████    $2.45/day  (fees $18) │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod chart;
pub mod error;
pub mod model;
pub mod strategy;

pub use advisor::{Advice, ConsolidationAdvisor};
pub use chart::{ChartFormat, ChartRenderer, ChartStyle, PngChartRenderer, SvgChartRenderer};
pub use error::{AdvisorError, Result};
pub use model::{
    ComparisonEntry, ConsolidationRequest, OptimizationResult, PlatformProjection,
    STATUS_QUO_LABEL,
};
pub use strategy::optimize;

/// Request shown to new users as a starting point
pub const EXAMPLE_REQUEST: &str = r#"{
  "platforms": ["Platform1", "Platform2", "Platform3"],
  "balances": [1234.56, 7890.12, 3456.78],
  "APRs": [0.12, 0.34, 0.56],
  "transfer_fee_matrix": [
    [0, 1.5, 2.0],
    [1.5, 0, 1.8],
    [2.0, 1.8, 0]
  ]
}"#;

/// Welcome message for new users, with a request they can copy
pub fn usage_message() -> String {
    format!(
        "👋 *Hello there!*\n\n\
         I'm here to help you optimize your funds! 🚀✨\n\n\
         📥 Send me your platforms, balances, APRs, and transfer fee matrix in JSON format.\n\n\
         💡 Here's an example to get you started:\n\
         ```json\n{EXAMPLE_REQUEST}\n```\n\
         📊 Let's crunch some numbers and find the best platform for you! 🏆"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_example_parses() {
        let message = usage_message();
        let start = message.find("```json\n").unwrap() + "```json\n".len();
        let end = message[start..].find("\n```").unwrap() + start;

        let request = ConsolidationRequest::from_json(&message[start..end]).unwrap();
        assert_eq!(request, ConsolidationRequest::example());
    }
}
